use macho_object::macho;
use macho_object::read::macho::{LoadCommandVariant, MachOFile, SymbolSection as ReadSymbolSection};
use macho_object::reloc::{GenericReloc, RelocationKind, X86_64Reloc};
use macho_object::write::{
    self, Command, IndirectSymbol, Relocation, RelocationTarget, Symbol, SymbolSection,
};
use macho_object::{Endianness, SectionFlags};

fn build(cputype: u32, endian: Endianness, kind: RelocationKind) -> Vec<u8> {
    let mut object = write::Object::new(cputype, 0, endian);
    let pointer_size = if object.is_64 { 8 } else { 4 };
    object.commands.push(Command::Uuid(*b"0123456789abcdef"));
    object.commands.push(Command::VersionMin {
        cmd: macho::LC_VERSION_MIN_MACOSX,
        version: 0x000a_0e00,
        sdk: 0x000b_0000,
    });
    object.commands.push(Command::SourceVersion(0x1234_5678));

    let text = object.add_portable_section(".text", SectionFlags::NONE);
    object.append_section_data(text, &[0xcc; 13], 4);
    let data = object.add_portable_section(".data", SectionFlags::NONE);
    object.append_section_data(data, b"hello\0", 3);
    let bss = object.add_portable_section(".bss", SectionFlags::NONE);
    object.append_zerofill(bss, 100, 4);
    let pointers = object.add_section(
        b"__DATA".to_vec(),
        b"__nl_symbol_ptr".to_vec(),
        macho::S_NON_LAZY_SYMBOL_POINTERS,
    );
    object.set_section_data(pointers, vec![0; 2 * pointer_size], 2);

    object.add_symbol(Symbol::new(&b"ltmp0"[..], SymbolSection::Section(text), 0, false));
    let main = object.add_symbol(Symbol::new(&b"_main"[..], SymbolSection::Section(text), 4, true));
    let mut weak = Symbol::new(&b"_hook"[..], SymbolSection::Section(data), 0, true);
    weak.weak = true;
    object.add_symbol(weak);
    object.add_symbol(Symbol::new(&b"_zero"[..], SymbolSection::Section(bss), 8, false));
    object.add_symbol(Symbol::new(&b"_abs"[..], SymbolSection::Absolute, 0x42, true));
    object.add_symbol(Symbol::new(&b"_common"[..], SymbolSection::Common, 16, true));
    let puts = object.add_symbol(Symbol::new(&b"_puts"[..], SymbolSection::Undefined, 0, true));
    let mut optional = Symbol::new(&b"_optional"[..], SymbolSection::Undefined, 0, true);
    optional.weak = true;
    object.add_symbol(optional);

    object
        .add_relocation(text, Relocation::new(0, kind, RelocationTarget::Symbol(puts)))
        .unwrap();
    object
        .add_relocation(text, Relocation::new(4, kind, RelocationTarget::Section(data)))
        .unwrap();
    object
        .add_relocation(data, Relocation::new(0, kind, RelocationTarget::Symbol(main)))
        .unwrap();

    object.add_indirect_symbol(pointers, IndirectSymbol::Symbol(puts));
    object.add_indirect_symbol(pointers, IndirectSymbol::Local);

    object.write().unwrap()
}

fn round_trip(bytes: &[u8]) {
    let file = MachOFile::parse(bytes).unwrap();
    let object = write::Object::from_file(&file).unwrap();
    assert_eq!(object.sections().len(), file.sections().len());
    assert_eq!(object.symbols().len(), file.symbols().unwrap().len());
    let rewritten = object.write().unwrap();
    assert!(rewritten == bytes, "rewritten file differs");
}

#[test]
fn x86_64() {
    let bytes = build(
        macho::CPU_TYPE_X86_64,
        Endianness::Little,
        RelocationKind::X86_64(X86_64Reloc::Unsigned64),
    );
    round_trip(&bytes);
}

#[test]
fn i386() {
    let bytes = build(
        macho::CPU_TYPE_X86,
        Endianness::Little,
        RelocationKind::Generic(GenericReloc::Vanilla32),
    );
    round_trip(&bytes);
}

#[test]
fn powerpc() {
    let bytes = build(
        macho::CPU_TYPE_POWERPC,
        Endianness::Big,
        RelocationKind::Generic(GenericReloc::Vanilla32),
    );
    round_trip(&bytes);
}

#[test]
fn powerpc64() {
    let bytes = build(
        macho::CPU_TYPE_POWERPC64,
        Endianness::Big,
        RelocationKind::Generic(GenericReloc::Vanilla32),
    );
    round_trip(&bytes);
}

#[test]
fn contents() {
    let bytes = build(
        macho::CPU_TYPE_X86_64,
        Endianness::Little,
        RelocationKind::X86_64(X86_64Reloc::Unsigned64),
    );
    let file = MachOFile::parse(&*bytes).unwrap();
    assert_eq!(file.uuid(), Some(*b"0123456789abcdef"));
    let version = file
        .commands()
        .iter()
        .find_map(|command| match command.variant {
            LoadCommandVariant::VersionMin(version) => Some(version),
            _ => None,
        })
        .unwrap();
    assert_eq!(version.version, 0x000a_0e00);
    assert_eq!(version.sdk, 0x000b_0000);

    let sections = file.sections();
    assert_eq!(sections.len(), 4);
    assert_eq!(sections[0].name(), b"__text");
    assert_eq!(sections[0].addr, 0);
    assert_eq!(sections[1].name(), b"__data");
    assert_eq!(sections[1].addr, 16);
    assert_eq!(file.section_data(&sections[1]).unwrap(), b"hello\0");
    assert!(sections[2].is_zerofill());
    assert_eq!(sections[2].size, 100);
    assert!(file.section_data(&sections[2]).unwrap().is_empty());
    // Zerofill sections are placed after all sections with file data.
    assert_eq!(sections[3].name(), b"__nl_symbol_ptr");
    assert_eq!(sections[3].addr, 24);
    assert_eq!(sections[2].addr, 48);

    let symbols = file.symbols().unwrap();
    let names: Vec<&[u8]> = symbols.symbols().iter().map(|symbol| symbol.name).collect();
    assert_eq!(
        names,
        [
            &b"ltmp0"[..],
            b"_zero",
            b"_abs",
            b"_hook",
            b"_main",
            b"_common",
            b"_optional",
            b"_puts",
        ]
    );
    let zero = symbols.symbol_by_name(b"_zero").unwrap();
    assert_eq!(zero.section, ReadSymbolSection::Section(sections[2].index));
    assert_eq!(zero.value, 8);
    assert!(symbols.symbol_by_name(b"_hook").unwrap().weak);
    assert!(symbols.symbol_by_name(b"_optional").unwrap().weak);
    assert_eq!(
        symbols.symbol_by_name(b"_abs").unwrap().section,
        ReadSymbolSection::Absolute
    );

    let relocations = file.relocations(&sections[0]).unwrap();
    assert_eq!(relocations.len(), 2);
    let stubs = file.stub_symbols().unwrap();
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].name, b"_puts$stub");
}

#[test]
fn unknown_command() {
    let mut bytes = build(
        macho::CPU_TYPE_X86_64,
        Endianness::Little,
        RelocationKind::X86_64(X86_64Reloc::Unsigned64),
    );
    let offset = {
        let file = MachOFile::parse(&*bytes).unwrap();
        file.command_by_type(macho::LC_UUID).unwrap().offset as usize
    };
    bytes[offset..offset + 4].copy_from_slice(&0x1000u32.to_le_bytes());

    let file = MachOFile::parse(&*bytes).unwrap();
    let object = write::Object::from_file(&file).unwrap();
    assert!(object.commands.contains(&Command::Opaque {
        cmd: 0x1000,
        data: b"0123456789abcdef".to_vec(),
    }));
    round_trip(&bytes);
}

fn put_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(data: &mut Vec<u8>, value: u64) {
    data.extend_from_slice(&value.to_le_bytes());
}

#[test]
fn build_version_command() {
    // A 64-bit object assembled by hand: an empty segment followed by
    // `LC_BUILD_VERSION`, which is not modelled by the writer.
    let mut bytes = Vec::new();
    put_u32(&mut bytes, macho::MH_MAGIC_64);
    put_u32(&mut bytes, macho::CPU_TYPE_X86_64);
    put_u32(&mut bytes, macho::CPU_SUBTYPE_X86_64_ALL);
    put_u32(&mut bytes, macho::MH_OBJECT);
    put_u32(&mut bytes, 2);
    put_u32(&mut bytes, 72 + 24);
    put_u32(&mut bytes, 0);
    put_u32(&mut bytes, 0);

    put_u32(&mut bytes, macho::LC_SEGMENT_64);
    put_u32(&mut bytes, 72);
    bytes.extend_from_slice(&[0; 16]);
    put_u64(&mut bytes, 0);
    put_u64(&mut bytes, 0);
    put_u64(&mut bytes, 32 + 72 + 24);
    put_u64(&mut bytes, 0);
    put_u32(&mut bytes, 7);
    put_u32(&mut bytes, 7);
    put_u32(&mut bytes, 0);
    put_u32(&mut bytes, 0);

    put_u32(&mut bytes, macho::LC_BUILD_VERSION);
    put_u32(&mut bytes, 24);
    // platform, minos, sdk, ntools
    put_u32(&mut bytes, 1);
    put_u32(&mut bytes, 0x000e_0000);
    put_u32(&mut bytes, 0x000e_0500);
    put_u32(&mut bytes, 0);
    assert_eq!(bytes.len(), 128);

    let file = MachOFile::parse(&*bytes).unwrap();
    assert_eq!(
        file.command_by_type(macho::LC_BUILD_VERSION).unwrap().variant,
        LoadCommandVariant::Unknown
    );
    let object = write::Object::from_file(&file).unwrap();
    assert_eq!(object.commands.len(), 1);
    assert_eq!(object.write().unwrap(), bytes);
}
