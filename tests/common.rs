#![cfg(all(feature = "read", feature = "write"))]

use macho_object::macho;
use macho_object::read::macho::{MachOFile, SymbolSection};
use macho_object::read::SymbolIndex;
use macho_object::reloc::{self, GenericReloc, RelocationKind, X86_64Reloc};
use macho_object::{write, Arch, Endianness};

fn foo_object(cputype: u32, endian: Endianness, kind: RelocationKind) -> Vec<u8> {
    let mut object = write::Object::new(cputype, 0, endian);
    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS | macho::S_ATTR_SOME_INSTRUCTIONS,
    );
    object.set_section_data(text, vec![0x90; 16], 4);
    let foo = object.add_symbol(write::Symbol::new(
        &b"_foo"[..],
        write::SymbolSection::Section(text),
        0,
        true,
    ));
    object
        .add_relocation(
            text,
            write::Relocation::new(0, kind, write::RelocationTarget::Symbol(foo)),
        )
        .unwrap();
    object.write().unwrap()
}

fn check_foo(bytes: &[u8], arch: Arch, kind: RelocationKind) {
    let file = MachOFile::parse(bytes).unwrap();
    assert_eq!(file.architecture(), arch);
    assert_eq!(file.filetype(), macho::MH_OBJECT);
    assert_eq!(file.segments().count(), 1);

    let sections = file.sections();
    assert_eq!(sections.len(), 1);
    let text = &sections[0];
    assert_eq!(text.segment_name(), b"__TEXT");
    assert_eq!(text.name(), b"__text");
    assert_eq!(text.size, 16);
    assert_eq!(file.section_data(text).unwrap(), &[0x90; 16][..]);

    let symbols = file.symbols().unwrap();
    assert_eq!(symbols.len(), 1);
    let foo = symbols.symbol_by_name(b"_foo").unwrap();
    assert!(foo.is_external());
    assert!(foo.is_definition());
    assert_eq!(foo.section, SymbolSection::Section(text.index));
    assert_eq!(foo.value, 0);

    let relocations = file.relocations(text).unwrap();
    assert_eq!(relocations.len(), 1);
    let relocation = &relocations[0];
    assert_eq!(relocation.address, 0);
    assert_eq!(relocation.kind, kind);
    assert_eq!(relocation.info.length, 2);
    assert!(!relocation.info.pcrel);
    assert!(relocation.info.r_extern);
    assert_eq!(
        relocation.target,
        reloc::RelocationTarget::Symbol(foo.index.0 as u32)
    );
    let target = file.symbol_by_index(SymbolIndex(foo.index.0)).unwrap();
    assert_eq!(target.name, b"_foo");
}

#[test]
fn foo_x86_64() {
    let kind = RelocationKind::X86_64(X86_64Reloc::Unsigned32);
    let bytes = foo_object(macho::CPU_TYPE_X86_64, Endianness::Little, kind);
    check_foo(&bytes, Arch::X86_64, kind);
}

#[test]
fn foo_i386() {
    let kind = RelocationKind::Generic(GenericReloc::Vanilla32);
    let bytes = foo_object(macho::CPU_TYPE_X86, Endianness::Little, kind);
    check_foo(&bytes, Arch::I386, kind);
}

#[test]
fn foo_powerpc_big_endian() {
    let kind = RelocationKind::Generic(GenericReloc::Vanilla32);
    let bytes = foo_object(macho::CPU_TYPE_POWERPC, Endianness::Big, kind);
    assert_eq!(&bytes[..4], &macho::MH_MAGIC.to_be_bytes());
    let file = MachOFile::parse(&*bytes).unwrap();
    assert_eq!(file.endianness(), Endianness::Big);
    assert_eq!(file.symbols().unwrap().len(), 1);
    let text = &file.sections()[0];
    let relocations = file.relocations(text).unwrap();
    assert_eq!(relocations.len(), 1);
    assert_eq!(relocations[0].info.length, 2);
}

#[test]
fn common_symbol() {
    let mut object = write::Object::new(
        macho::CPU_TYPE_ARM64,
        macho::CPU_SUBTYPE_ARM64_ALL,
        Endianness::Little,
    );
    object.add_symbol(write::Symbol::new(
        &b"_buffer"[..],
        write::SymbolSection::Common,
        64,
        true,
    ));
    object.add_symbol(write::Symbol::new(
        &b"_printf"[..],
        write::SymbolSection::Undefined,
        0,
        true,
    ));
    let bytes = object.write().unwrap();

    let file = MachOFile::parse(&*bytes).unwrap();
    assert_eq!(file.architecture(), Arch::Arm64);
    assert!(file.sections().is_empty());
    let symbols = file.symbols().unwrap();
    let buffer = symbols.symbol_by_name(b"_buffer").unwrap();
    assert_eq!(buffer.section, SymbolSection::Common);
    assert_eq!(buffer.value, 64);
    assert!(buffer.global);
    let printf = symbols.symbol_by_name(b"_printf").unwrap();
    assert_eq!(printf.section, SymbolSection::Undefined);
    assert!(printf.is_undefined());

    // Both are in the undefined range, sorted by name.
    let dysymtab = file.dysymtab().unwrap().unwrap();
    assert_eq!(dysymtab.local_symbols().len(), 0);
    assert_eq!(dysymtab.external_symbols().len(), 0);
    assert_eq!(dysymtab.undefined_symbols(), 0..2);
    assert_eq!(symbols.symbols()[0].name, b"_buffer");
    assert_eq!(symbols.symbols()[1].name, b"_printf");
}
