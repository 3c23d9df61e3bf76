use macho_object::macho;
use macho_object::read::macho::{LoadCommandVariant, MachOFatFile, MachOFile, SymbolSection};
use macho_object::reloc::{GenericReloc, RelocationKind};
use macho_object::write::{self, IndirectSymbol, RelocationTarget};
use macho_object::Endianness;

fn put_u32(data: &mut [u8], offset: u64, value: u32) {
    let offset = offset as usize;
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn command_offset(data: &[u8], cmd: u32) -> u64 {
    let file = MachOFile::parse(data).unwrap();
    file.command_by_type(cmd).unwrap().offset
}

fn i386_object() -> (write::Object<'static>, write::SectionId) {
    let mut object = write::Object::new(
        macho::CPU_TYPE_X86,
        macho::CPU_SUBTYPE_I386_ALL,
        Endianness::Little,
    );
    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS,
    );
    object.set_section_data(text, vec![0; 16], 2);
    let data = object.add_section(b"__DATA".to_vec(), b"__data".to_vec(), 0);
    object.set_section_data(data, vec![0; 8], 2);
    (object, text)
}

fn relocation(address: u32, kind: GenericReloc, value: u32) -> write::Relocation {
    write::Relocation::new(
        address,
        RelocationKind::Generic(kind),
        RelocationTarget::Scattered { value },
    )
}

#[test]
fn sectdiff_pair() {
    let (mut object, text) = i386_object();
    object
        .add_relocation(text, relocation(4, GenericReloc::Sectdiff32, 0x10))
        .unwrap();
    object
        .add_relocation(text, relocation(0, GenericReloc::Pair32, 0))
        .unwrap();
    let bytes = object.write().unwrap();

    let file = MachOFile::parse(&*bytes).unwrap();
    let text = &file.sections()[0];
    let relocations = file.relocations(text).unwrap();
    assert_eq!(relocations.len(), 2);
    assert_eq!(
        relocations[0].kind,
        RelocationKind::Generic(GenericReloc::Sectdiff32)
    );
    assert_eq!(
        relocations[1].kind,
        RelocationKind::Generic(GenericReloc::Pair32)
    );
    // The pair record applies to the address of the first record.
    assert_eq!(relocations[1].address, 4);
}

#[test]
fn pair_without_predecessor() {
    let (mut object, text) = i386_object();
    object
        .add_relocation(text, relocation(0, GenericReloc::Pair32, 0))
        .unwrap();
    let bytes = object.write().unwrap();

    let file = MachOFile::parse(&*bytes).unwrap();
    let text = &file.sections()[0];
    // The raw records are still available.
    assert_eq!(file.relocation_infos(text).unwrap().count(), 1);
    assert!(file.relocations(text).is_err());
}

#[test]
fn sectdiff_without_pair() {
    let (mut object, text) = i386_object();
    object
        .add_relocation(text, relocation(4, GenericReloc::Sectdiff32, 0x10))
        .unwrap();
    let bytes = object.write().unwrap();

    let file = MachOFile::parse(&*bytes).unwrap();
    assert!(file.relocations(&file.sections()[0]).is_err());
}

fn lazy_pointer_object() -> Vec<u8> {
    let mut object = write::Object::new(
        macho::CPU_TYPE_X86_64,
        macho::CPU_SUBTYPE_X86_64_ALL,
        Endianness::Little,
    );
    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS,
    );
    object.set_section_data(text, vec![0xc3; 8], 4);
    let pointers = object.add_section(
        b"__DATA".to_vec(),
        b"__la_symbol_ptr".to_vec(),
        macho::S_LAZY_SYMBOL_POINTERS,
    );
    object.set_section_data(pointers, vec![0; 24], 3);
    let puts = object.add_symbol(write::Symbol::new(
        &b"_puts"[..],
        write::SymbolSection::Undefined,
        0,
        true,
    ));
    let exit = object.add_symbol(write::Symbol::new(
        &b"_exit"[..],
        write::SymbolSection::Undefined,
        0,
        true,
    ));
    object.add_indirect_symbol(pointers, IndirectSymbol::Symbol(puts));
    object.add_indirect_symbol(pointers, IndirectSymbol::Local);
    object.add_indirect_symbol(pointers, IndirectSymbol::Symbol(exit));
    object.write().unwrap()
}

#[test]
fn stub_symbols() {
    let bytes = lazy_pointer_object();
    let file = MachOFile::parse(&*bytes).unwrap();
    let section = &file.sections()[1];
    assert!(section.is_indirect());
    assert_eq!(section.indirect_count(true), 3);
    assert_eq!(file.indirect_symbols().unwrap().len(), 3);

    let stubs = file.stub_symbols().unwrap();
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[0].name, b"_puts$stub");
    assert_eq!(stubs[0].value, 0);
    assert_eq!(stubs[1].name, b"_exit$stub");
    assert_eq!(stubs[1].value, 16);
    for stub in &stubs {
        assert_eq!(stub.section, section.index);
        assert_eq!(stub.address, section.addr + stub.value);
    }
    let symbols = file.symbols().unwrap();
    assert_eq!(symbols.symbol(stubs[0].symbol).unwrap().name, b"_puts");
}

#[test]
fn stub_symbol_index_out_of_range() {
    let mut bytes = lazy_pointer_object();
    let indirectsymoff = {
        let file = MachOFile::parse(&*bytes).unwrap();
        let tables = file.dysymtab().unwrap().unwrap();
        u64::from(tables.fields.indirectsymoff)
    };
    // The `_exit` slot points past the end of the symbol table.
    put_u32(&mut bytes, indirectsymoff + 8, 7);

    let file = MachOFile::parse(&*bytes).unwrap();
    let indirect = file.indirect_symbols().unwrap();
    assert_eq!(indirect[1], macho::INDIRECT_SYMBOL_LOCAL);
    assert_eq!(indirect[2], 7);
    let stubs = file.stub_symbols().unwrap();
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].name, b"_puts$stub");
}

#[test]
fn stub_address_wraps() {
    let mut bytes = lazy_pointer_object();
    let header = bytes
        .windows(16)
        .position(|name| name == b"__la_symbol_ptr\0")
        .unwrap();
    let addr = header + 32;
    bytes[addr..addr + 8].copy_from_slice(&(u64::MAX - 7).to_le_bytes());

    let file = MachOFile::parse(&*bytes).unwrap();
    let stubs = file.stub_symbols().unwrap();
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[0].address, u64::MAX - 7);
    assert_eq!(stubs[1].value, 16);
    assert_eq!(stubs[1].address, 8);
}

fn local_symbol_object() -> Vec<u8> {
    let mut object = write::Object::new(
        macho::CPU_TYPE_X86_64,
        macho::CPU_SUBTYPE_X86_64_ALL,
        Endianness::Little,
    );
    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS,
    );
    object.set_section_data(text, vec![0xc3; 4], 0);
    object.add_symbol(write::Symbol::new(
        &b"ltmp0"[..],
        write::SymbolSection::Section(text),
        0,
        false,
    ));
    object.commands.push(write::Command::Uuid([7; 16]));
    object.write().unwrap()
}

#[test]
fn invalid_symbol_section() {
    let mut bytes = local_symbol_object();
    let symoff = MachOFile::parse(&*bytes).unwrap().symtab().unwrap().symoff;
    // `n_sect` follows `n_strx` and `n_type`.
    bytes[symoff as usize + 5] = 5;

    let file = MachOFile::parse(&*bytes).unwrap();
    let symbol = &file.symbols().unwrap().symbols()[0];
    assert_eq!(symbol.name, b"ltmp0");
    assert_eq!(symbol.n_sect, 5);
    assert_eq!(symbol.section, SymbolSection::Undefined);
}

#[test]
fn duplicate_symtab() {
    let mut bytes = local_symbol_object();
    let offset = command_offset(&bytes, macho::LC_DYSYMTAB);
    put_u32(&mut bytes, offset, macho::LC_SYMTAB);
    assert!(MachOFile::parse(&*bytes).is_err());
}

#[test]
fn unknown_command() {
    let mut bytes = local_symbol_object();
    let offset = command_offset(&bytes, macho::LC_UUID);
    put_u32(&mut bytes, offset, 0x1000);

    let file = MachOFile::parse(&*bytes).unwrap();
    assert_eq!(file.uuid(), None);
    let command = file.command_by_type(0x1000).unwrap();
    assert_eq!(command.variant, LoadCommandVariant::Unknown);
    assert_eq!(command.raw_cmd(), 0x1000);
    assert_eq!(command.data.len(), 24);
    assert_eq!(&command.data[8..], &[7; 16]);
    // The rest of the file is unaffected.
    assert_eq!(file.symbols().unwrap().len(), 1);
}

#[test]
fn dysymtab_partition() {
    let mut bytes = local_symbol_object();
    {
        let file = MachOFile::parse(&*bytes).unwrap();
        let dysymtab = file.dysymtab().unwrap().unwrap();
        assert_eq!(dysymtab.local_symbols(), 0..1);
        assert_eq!(dysymtab.external_symbols(), 1..1);
        assert_eq!(dysymtab.undefined_symbols(), 1..1);
    }

    let offset = command_offset(&bytes, macho::LC_DYSYMTAB);
    // `nlocalsym` follows `cmd`, `cmdsize` and `ilocalsym`.
    put_u32(&mut bytes, offset + 12, 2);
    let file = MachOFile::parse(&*bytes).unwrap();
    assert!(file.dysymtab().is_err());
}

#[test]
fn too_many_fat_members() {
    let nfat_arch = macho::FAT_MAX_ARCH + 1;
    let mut data = Vec::new();
    data.extend_from_slice(&macho::FAT_MAGIC.to_be_bytes());
    data.extend_from_slice(&nfat_arch.to_be_bytes());
    data.resize(8 + 20 * nfat_arch as usize, 0);
    assert!(MachOFatFile::parse(&*data).is_err());
}

#[test]
fn truncated_commands() {
    let bytes = local_symbol_object();
    let file = MachOFile::parse(&*bytes).unwrap();
    let end = file.header().size() as usize + file.header().sizeofcmds as usize;
    assert!(MachOFile::parse(&bytes[..end - 4]).is_err());
}
