#![cfg(all(feature = "read", feature = "write", feature = "std"))]

use macho_object::macho;
use macho_object::read::macho::MachOFile;
use macho_object::write::{Object, StreamingBuffer};
use macho_object::Endianness;

#[test]
fn aligned_sections() {
    let mut object = Object::new(
        macho::CPU_TYPE_X86_64,
        macho::CPU_SUBTYPE_X86_64_ALL,
        Endianness::Little,
    );

    let text = object.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS,
    );
    object.set_section_data(text, &[0xc3][..], 12);
    let data = object.add_section(b"__DATA".to_vec(), b"__data".to_vec(), 0);
    object.set_section_data(data, &b"1234"[..], 4);

    let mut buffer = StreamingBuffer::new(vec![]);
    object.emit(&mut buffer).unwrap();
    buffer.result().unwrap();
    let streamed = buffer.into_inner();
    assert_eq!(streamed, object.write().unwrap());

    let file = MachOFile::parse(&*streamed).unwrap();
    let sections = file.sections();
    assert_eq!(sections[0].align, 12);
    assert_eq!(sections[1].addr, 16);
    assert_eq!(sections[1].align, 4);
    // Section data is placed at the segment file offset plus its address.
    let segment = file.segments().next().unwrap();
    assert_eq!(
        u64::from(sections[1].offset),
        segment.fileoff + sections[1].addr
    );
    assert_eq!(file.section_data(&sections[1]).unwrap(), b"1234");
}
