#![cfg(all(feature = "read", feature = "write"))]

use macho_object::macho;
use macho_object::reloc::{GenericReloc, RelocationKind, X86_64Reloc};
use macho_object::write::{self, Relocation, RelocationTarget, Symbol, SymbolSection};
use macho_object::Endianness;
use macho_object_examples::readobj::{self, PrintOptions};

fn hello(cputype: u32) -> Vec<u8> {
    let mut object = write::Object::new(cputype, 0, Endianness::Little);
    object.commands.push(write::Command::Uuid([0xab; 16]));
    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS,
    );
    object.append_section_data(text, &[0xe8, 0, 0, 0, 0, 0xc3], 4);
    object.add_symbol(Symbol::new(&b"_main"[..], SymbolSection::Section(text), 0, true));
    let puts = object.add_symbol(Symbol::new(&b"_puts"[..], SymbolSection::Undefined, 0, true));
    let kind = if cputype == macho::CPU_TYPE_X86_64 {
        RelocationKind::X86_64(X86_64Reloc::Branch32)
    } else {
        RelocationKind::Generic(GenericReloc::Vanilla32)
    };
    object
        .add_relocation(
            text,
            Relocation::new(1, kind, RelocationTarget::Symbol(puts)),
        )
        .unwrap();
    object.write().unwrap()
}

fn print(data: &[u8], options: &PrintOptions) -> (String, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    readobj::print(&mut out, &mut err, data, options);
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

#[test]
fn thin() {
    let data = hello(macho::CPU_TYPE_X86_64);
    let (out, err) = print(&data, &PrintOptions::all());
    assert_eq!(err, "");
    assert!(out.starts_with("Format: Mach-O 64-bit\n"));
    assert!(out.contains("CpuType: x86_64 (0x1000007)\n"));
    assert!(out.contains("FileType: object (0x1)\n"));
    assert!(out.contains("SectionName: \"__text\"\n"));
    assert!(out.contains("String: \"_main\" (0x"));
    assert!(out.contains("Symbol: \"_puts\" (0x"));
    assert!(out.contains("UuidCommand {\n"));
    assert!(out.contains("DysymtabCommand {\n"));
}

#[test]
fn selected_groups() {
    let data = hello(macho::CPU_TYPE_X86_64);
    let options = PrintOptions {
        symbols: true,
        string_indices: false,
        ..PrintOptions::none()
    };
    let (out, err) = print(&data, &options);
    assert_eq!(err, "");
    assert!(out.contains("String: \"_main\"\n"));
    assert!(!out.contains("MachHeader"));
    assert!(!out.contains("Section {"));
    assert!(!out.contains("UuidCommand"));
}

#[test]
fn fat() {
    let x86_64 = hello(macho::CPU_TYPE_X86_64);
    let i386 = hello(macho::CPU_TYPE_X86);
    let mut fat = write::FatBuilder::new();
    fat.add(&x86_64).add(&i386);
    let data = fat.write().unwrap();
    let (out, err) = print(&data, &PrintOptions::all());
    assert_eq!(err, "");
    assert!(out.starts_with("Format: Mach-O Fat 32-bit\n"));
    assert_eq!(out.matches("FatArch {").count(), 2);
    assert!(out.contains("Format: Mach-O 64-bit\n"));
    assert!(out.contains("Format: Mach-O 32-bit\n"));
}

#[test]
fn truncated() {
    let data = hello(macho::CPU_TYPE_X86_64);
    let (out, err) = print(&data[..40], &PrintOptions::all());
    assert!(!out.contains("Section {"));
    assert!(err.starts_with("Error: ") || err.starts_with("Failed to parse file: "));
}
