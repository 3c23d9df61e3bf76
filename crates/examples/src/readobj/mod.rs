use std::io::Write;
use std::{fmt, str};

use macho_object::names::Xlat;
use macho_object::read::FileKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub string_indices: bool,
    pub file: bool,
    pub load_commands: bool,
    pub sections: bool,
    pub symbols: bool,
    pub relocations: bool,
    pub dysymtab: bool,
}

impl PrintOptions {
    pub fn all() -> Self {
        PrintOptions {
            string_indices: true,
            file: true,
            load_commands: true,
            sections: true,
            symbols: true,
            relocations: true,
            dysymtab: true,
        }
    }

    pub fn none() -> Self {
        PrintOptions {
            string_indices: true,
            file: false,
            load_commands: false,
            sections: false,
            symbols: false,
            relocations: false,
            dysymtab: false,
        }
    }
}

pub fn print(w: &'_ mut dyn Write, e: &'_ mut dyn Write, file: &[u8], options: &PrintOptions) {
    let mut printer = Printer::new(w, e, options);
    print_object(&mut printer, file);
}

struct Printer<'a> {
    w: &'a mut dyn Write,
    e: &'a mut dyn Write,
    options: &'a PrintOptions,
    indent: usize,
}

impl<'a> Printer<'a> {
    fn new(w: &'a mut dyn Write, e: &'a mut dyn Write, options: &'a PrintOptions) -> Self {
        Self {
            w,
            e,
            options,
            indent: 0,
        }
    }

    fn w(&mut self) -> &mut dyn Write {
        self.w
    }

    fn blank(&mut self) {
        writeln!(self.w).unwrap();
    }

    fn print_indent(&mut self) {
        if self.indent != 0 {
            write!(self.w, "{:-1$}", " ", self.indent * 4).unwrap();
        }
    }

    fn print_string(&mut self, s: &[u8]) {
        if let Ok(s) = str::from_utf8(s) {
            write!(self.w, "\"{}\"", s).unwrap();
        } else {
            write!(self.w, "{:X?}", s).unwrap();
        }
    }

    fn indent<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }

    fn group<F: FnOnce(&mut Self)>(&mut self, name: &str, f: F) {
        self.print_indent();
        writeln!(self.w, "{} {{", name).unwrap();
        self.indent(f);
        self.print_indent();
        writeln!(self.w, "}}").unwrap();
    }

    fn field_name(&mut self, name: &str) {
        self.print_indent();
        if !name.is_empty() {
            write!(self.w, "{}: ", name).unwrap();
        }
    }

    fn field<T: fmt::Display>(&mut self, name: &str, value: T) {
        self.field_name(name);
        writeln!(self.w, "{}", value).unwrap();
    }

    fn field_hex<T: fmt::UpperHex>(&mut self, name: &str, value: T) {
        self.field_name(name);
        writeln!(self.w, "0x{:X}", value).unwrap();
    }

    fn field_bytes(&mut self, name: &str, value: &[u8]) {
        self.field_name(name);
        writeln!(self.w, "{:X?}", value).unwrap();
    }

    /// Print a string, followed by its string table index if enabled.
    fn field_string<T: fmt::UpperHex>(&mut self, name: &str, value: T, s: &[u8]) {
        self.field_name(name);
        self.print_string(s);
        if self.options.string_indices {
            writeln!(self.w, " (0x{:X})", value).unwrap();
        } else {
            writeln!(self.w).unwrap();
        }
    }

    fn field_inline_string(&mut self, name: &str, s: &[u8]) {
        self.field_name(name);
        self.print_string(s);
        writeln!(self.w).unwrap();
    }

    fn field_enum(&mut self, name: &str, value: u32, table: &[Xlat]) {
        if let Some(entry) = table.iter().find(|entry| entry.value == value) {
            self.field_name(name);
            writeln!(self.w, "{} (0x{:X})", entry.name, value).unwrap();
        } else {
            self.field_hex(name, value);
        }
    }

    /// Print the entries of `table` that are set in `value`.
    ///
    /// If `mask` is non-zero then `value & mask` is printed as a single enum.
    fn flags(&mut self, value: u32, mask: u32, table: &[Xlat]) {
        self.indent(|p| {
            if mask != 0 {
                let value = value & mask;
                match table.iter().find(|entry| entry.value == value) {
                    Some(entry) => {
                        p.print_indent();
                        writeln!(p.w, "{} (0x{:X})", entry.name, value).unwrap();
                    }
                    None => {
                        p.print_indent();
                        writeln!(p.w, "<unknown> (0x{:X})", value).unwrap();
                    }
                }
            } else {
                let mut unknown = value;
                for entry in table {
                    if entry.value != 0 && value & entry.value == entry.value {
                        p.print_indent();
                        writeln!(p.w, "{} (0x{:X})", entry.name, entry.value).unwrap();
                        unknown &= !entry.value;
                    }
                }
                if unknown != 0 {
                    p.print_indent();
                    writeln!(p.w, "<unknown> (0x{:X})", unknown).unwrap();
                }
            }
        });
    }
}

fn print_object(p: &mut Printer<'_>, data: &[u8]) {
    let kind = match FileKind::parse(data) {
        Ok(file) => file,
        Err(err) => {
            writeln!(p.e, "Failed to parse file: {}", err).unwrap();
            return;
        }
    };
    match kind {
        FileKind::MachO32 | FileKind::MachO64 => macho::print_macho(p, data),
        FileKind::MachOFat32 => macho::print_macho_fat(p, data),
        _ => {}
    }
}

trait PrintErr<T> {
    fn print_err(self, p: &mut Printer<'_>) -> Option<T>;
}

impl<T, E: fmt::Display> PrintErr<T> for Result<T, E> {
    fn print_err(self, p: &mut Printer<'_>) -> Option<T> {
        match self {
            Ok(val) => Some(val),
            Err(err) => {
                writeln!(p.e, "Error: {}", err).unwrap();
                None
            }
        }
    }
}

mod macho;
