use macho_object::macho;
use macho_object::read::macho::{extract_image, MachOFatFile, MachOFile};
use macho_object::write::{self, FatBuilder, FAT_DEFAULT_ALIGN};
use macho_object::Endianness;

fn image(cputype: u32, cpusubtype: u32, endian: Endianness) -> Vec<u8> {
    let mut object = write::Object::new(cputype, cpusubtype, endian);
    let text = object.add_section(b"__TEXT".to_vec(), b"__text".to_vec(), 0);
    object.set_section_data(text, cputype.to_be_bytes().to_vec(), 2);
    object.add_symbol(write::Symbol::new(
        &b"_start"[..],
        write::SymbolSection::Section(text),
        0,
        true,
    ));
    object.write().unwrap()
}

fn images() -> Vec<(u32, u32, Vec<u8>)> {
    [
        (macho::CPU_TYPE_X86_64, macho::CPU_SUBTYPE_X86_64_ALL, Endianness::Little),
        (macho::CPU_TYPE_ARM64, macho::CPU_SUBTYPE_ARM64_ALL, Endianness::Little),
        (macho::CPU_TYPE_X86, macho::CPU_SUBTYPE_I386_ALL, Endianness::Little),
        (macho::CPU_TYPE_POWERPC, macho::CPU_SUBTYPE_POWERPC_ALL, Endianness::Big),
    ]
    .iter()
    .map(|&(cputype, cpusubtype, endian)| {
        (cputype, cpusubtype, image(cputype, cpusubtype, endian))
    })
    .collect()
}

#[test]
fn pack_and_unpack() {
    let images = images();
    let mut builder = FatBuilder::new();
    for (_, _, data) in &images {
        builder.add(data);
    }
    assert_eq!(builder.len(), images.len());
    let fat = builder.write().unwrap();

    let file = MachOFatFile::parse(&*fat).unwrap();
    assert_eq!(file.arches().len(), images.len());
    for (member, (cputype, cpusubtype, data)) in file.members().zip(&images) {
        let member = member.unwrap();
        assert_eq!(member.arch.cputype(), *cputype);
        assert_eq!(member.arch.cpusubtype(), *cpusubtype);
        assert_eq!(member.arch.align(), FAT_DEFAULT_ALIGN);
        assert_eq!(member.arch.offset() % (1 << FAT_DEFAULT_ALIGN), 0);
        assert_eq!(member.data, &data[..]);
    }

    for (cputype, cpusubtype, data) in &images {
        let image = file.extract(*cputype, *cpusubtype).unwrap();
        assert_eq!(image.header().cputype, *cputype);
        let text = &image.sections()[0];
        assert_eq!(image.section_data(text).unwrap(), &cputype.to_be_bytes()[..]);

        let image = extract_image(&fat, *cputype, *cpusubtype).unwrap();
        assert_eq!(image.data(), &data[..]);
    }
    assert!(file.extract(macho::CPU_TYPE_ARM, 0).is_err());
}

#[test]
fn thin_image() {
    let data = image(
        macho::CPU_TYPE_ARM64,
        macho::CPU_SUBTYPE_ARM64_ALL,
        Endianness::Little,
    );
    let file = extract_image(&data, macho::CPU_TYPE_ARM64, macho::CPU_SUBTYPE_ARM64_ALL).unwrap();
    assert_eq!(file.symbols().unwrap().len(), 1);
    assert!(extract_image(&data, macho::CPU_TYPE_X86_64, macho::CPU_SUBTYPE_X86_64_ALL).is_err());
    // A thin image is not a fat archive.
    assert!(MachOFatFile::parse(&*data).is_err());
    assert!(MachOFile::parse(&*data).is_ok());
}

#[test]
fn member_alignment() {
    let images = images();
    let mut builder = FatBuilder::new();
    builder.align = 3;
    for (_, _, data) in &images {
        builder.add(data);
    }
    let fat = builder.write().unwrap();
    let file = MachOFatFile::parse(&*fat).unwrap();
    let mut end = 8 + 20 * images.len() as u64;
    for arch in file.arches() {
        let (offset, size) = arch.file_range();
        assert_eq!(offset % 8, 0);
        assert!(offset >= end && offset < end + 8);
        end = offset + size;
    }
    assert_eq!(end, fat.len() as u64);
}
