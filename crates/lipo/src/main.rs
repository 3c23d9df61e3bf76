use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use macho_object::read::macho::{extract_image, MachOFatFile, MachOFile};
use macho_object::read::FileKind;
use macho_object::{names, write};

fn main() -> Result<()> {
    let matches = command!()
        .max_term_width(100)
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .subcommands([
            Command::new("list")
                .about("List the architectures of Mach-O files")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("The input files"),
                ),
            Command::new("extract")
                .about("Extract a single architecture image")
                .args([
                    Arg::new("input")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("The fat archive or thin Mach-O file"),
                    Arg::new("arch")
                        .long("arch")
                        .required(true)
                        .value_name("name")
                        .value_parser(clap::value_parser!(String))
                        .help("The cpu type to extract, such as `x86_64` or `arm64`"),
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("The output file, or `-` for stdout"),
                ]),
            Command::new("create")
                .about("Create a fat archive from thin Mach-O files")
                .args([
                    Arg::new("input")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("The thin Mach-O files"),
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("The output file, or `-` for stdout"),
                    Arg::new("align")
                        .long("align")
                        .value_name("log2")
                        .value_parser(clap::value_parser!(u32).range(0..32))
                        .help("The member alignment as a power of 2 [default: 14]"),
                ]),
        ])
        .get_matches();

    if matches.get_flag("verbose") {
        env_logger::builder()
            .format_level(false)
            .format_target(false)
            .filter_module("machopack", log::LevelFilter::Debug)
            .filter_module("macho_object", log::LevelFilter::Debug)
            .init();
    }

    match matches.subcommand() {
        Some(("list", matches)) => list(matches),
        Some(("extract", matches)) => extract(matches),
        Some(("create", matches)) => create(matches),
        _ => unreachable!(),
    }
}

fn map(path: &Path) -> Result<memmap2::Mmap> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
    unsafe { memmap2::Mmap::map(&file) }
        .with_context(|| format!("Failed to map input file '{}'", path.display()))
}

fn cpu_name(cputype: u32) -> String {
    match names::cpu_type_name(cputype) {
        Some(name) => name.to_string(),
        None => format!("{:#x}", cputype),
    }
}

fn list(matches: &ArgMatches) -> Result<()> {
    let paths = matches.get_many::<PathBuf>("input").unwrap_or_default();
    for path in paths {
        let data = map(path)?;
        let data = &*data;
        let kind = FileKind::parse(data)
            .with_context(|| format!("Failed to parse input file '{}'", path.display()))?;
        let mut arches = Vec::new();
        match kind {
            FileKind::MachOFat32 => {
                let fat = MachOFatFile::parse(data)
                    .with_context(|| format!("Failed to parse fat archive '{}'", path.display()))?;
                for arch in fat.arches() {
                    log::debug!(
                        "{}: member at {:#x}, size {:#x}, align {}",
                        cpu_name(arch.cputype()),
                        arch.offset(),
                        arch.size(),
                        arch.align()
                    );
                    arches.push(cpu_name(arch.cputype()));
                }
                println!("{} (fat): {}", path.display(), arches.join(" "));
            }
            _ => {
                let file = MachOFile::parse(data)
                    .with_context(|| format!("Failed to parse input file '{}'", path.display()))?;
                println!(
                    "{} (thin): {}",
                    path.display(),
                    cpu_name(file.header().cputype)
                );
            }
        }
    }
    Ok(())
}

fn extract(matches: &ArgMatches) -> Result<()> {
    let in_path = matches.get_one::<PathBuf>("input").unwrap();
    let arch = matches.get_one::<String>("arch").unwrap();
    let out_path = matches.get_one::<PathBuf>("output").unwrap();

    let cputype = names::value(names::CPU_TYPES, arch)
        .ok_or_else(|| anyhow!("Unknown architecture name `{}`", arch))?;
    let data = map(in_path)?;
    let data = &*data;
    // Use the subtype of the first matching member so that any subtype
    // of the named cpu type is accepted.
    let cpusubtype = match FileKind::parse(data) {
        Ok(FileKind::MachOFat32) => MachOFatFile::parse(data)
            .ok()
            .and_then(|fat| fat.arches().iter().find(|a| a.cputype() == cputype))
            .map(|a| a.cpusubtype()),
        _ => MachOFile::parse(data).ok().map(|file| file.header().cpusubtype),
    };
    let Some(cpusubtype) = cpusubtype else {
        bail!("'{}' does not contain architecture `{}`", in_path.display(), arch);
    };
    let image = extract_image(data, cputype, cpusubtype).with_context(|| {
        format!(
            "Failed to extract `{}` from '{}'",
            arch,
            in_path.display()
        )
    })?;
    log::debug!("Extracted {:#x} bytes", image.data().len());
    write_output(out_path, image.data())
}

fn create(matches: &ArgMatches) -> Result<()> {
    let in_paths: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("input")
        .unwrap_or_default()
        .collect();
    let out_path = matches.get_one::<PathBuf>("output").unwrap();

    let mut maps = Vec::with_capacity(in_paths.len());
    for path in &in_paths {
        maps.push(map(path)?);
    }
    let mut builder = write::FatBuilder::new();
    if let Some(align) = matches.get_one::<u32>("align") {
        builder.align = *align;
    }
    for (path, data) in in_paths.iter().zip(&maps) {
        let file = MachOFile::parse(&**data)
            .with_context(|| format!("Failed to parse input file '{}'", path.display()))?;
        log::debug!(
            "Adding {} from '{}'",
            cpu_name(file.header().cputype),
            path.display()
        );
        builder.add(data);
    }
    let data = builder.write().context("Failed to build fat archive")?;
    write_output(out_path, &data)
}

fn write_output(out_path: &Path, data: &[u8]) -> Result<()> {
    if out_path == Path::new("-") {
        io::stdout()
            .lock()
            .write_all(data)
            .with_context(|| "Failed to write output to stdout")?;
        return Ok(());
    }
    let mut out_file = fs::File::create(out_path)
        .with_context(|| format!("Failed to create output file '{}'", out_path.display()))?;
    out_file.write_all(data).with_context(|| {
        // This is a regular file that we either created or truncated,
        // so we can safely remove it.
        fs::remove_file(out_path).ok();
        format!("Failed to write output file '{}'", out_path.display())
    })?;
    Ok(())
}
