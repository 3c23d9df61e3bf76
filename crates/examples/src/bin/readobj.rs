//! Print the structures of Mach-O files and fat archives.

use clap::{Arg, ArgAction, Command};
use macho_object_examples::readobj;
use std::path::PathBuf;
use std::{fs, io};

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn main() {
    let matches = Command::new("readobj")
        .arg(
            Arg::new("file")
                .action(ArgAction::Append)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("The file to read"),
        )
        .arg(flag("file-header", "Print the Mach-O header and fat headers"))
        .arg(flag("load-commands", "Print the load commands"))
        .arg(flag("sections", "Print the segments and their sections"))
        .arg(flag("symbols", "Print the symbol table"))
        .arg(flag("relocations", "Print the relocations of each section"))
        .arg(flag("dysymtab", "Print the dynamic symbol table"))
        .arg(flag("no-string-indices", "Don't print string table indices"))
        .get_matches();
    let mut options = readobj::PrintOptions {
        file: matches.get_flag("file-header"),
        load_commands: matches.get_flag("load-commands"),
        sections: matches.get_flag("sections"),
        symbols: matches.get_flag("symbols"),
        relocations: matches.get_flag("relocations"),
        dysymtab: matches.get_flag("dysymtab"),
        ..readobj::PrintOptions::none()
    };
    if options == readobj::PrintOptions::none() {
        options = readobj::PrintOptions::all();
    }
    options.string_indices = !matches.get_flag("no-string-indices");

    let file_paths = matches.get_many::<PathBuf>("file").unwrap();
    let file_count = file_paths.len();
    for file_path in file_paths {
        if file_count > 1 {
            println!();
            println!("{}:", file_path.display());
        }

        let file = match fs::File::open(file_path) {
            Ok(file) => file,
            Err(err) => {
                println!("Failed to open file '{}': {}", file_path.display(), err);
                continue;
            }
        };
        let mmap = match unsafe { memmap2::Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(err) => {
                println!("Failed to map file '{}': {}", file_path.display(), err);
                continue;
            }
        };
        let stdout = io::stdout();
        let stderr = io::stderr();
        readobj::print(&mut stdout.lock(), &mut stderr.lock(), &mmap, &options);
    }
}
