/// This example demonstrates how to create a Mach-O object file with a simple main function that
/// calls puts("Hello, world!").
///
/// The resulting object file can be linked on an x86-64 macOS host:
/// ```sh
/// $ cargo run --features write --bin simple_write
/// $ cc -o hello hello.o
/// $ ./hello
/// Hello, world!
/// ```
use macho_object::macho;
use macho_object::reloc::{RelocationKind, X86_64Reloc};
use macho_object::write::{Object, Relocation, RelocationTarget, Symbol, SymbolSection};
use macho_object::Endianness;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut obj = Object::new(
        macho::CPU_TYPE_X86_64,
        macho::CPU_SUBTYPE_X86_64_ALL,
        Endianness::Little,
    );
    obj.flags = macho::MH_SUBSECTIONS_VIA_SYMBOLS;

    // Generate code for the equivalent of this C function:
    //     int main() {
    //         puts("Hello, world!");
    //         return 0;
    //     }
    let mut main_data = Vec::new();
    // push %rbp; mov %rsp, %rbp
    main_data.extend_from_slice(&[0x55, 0x48, 0x89, 0xe5]);
    // lea 0x0(%rip), %rdi
    main_data.extend_from_slice(&[0x48, 0x8d, 0x3d, 0x00, 0x00, 0x00, 0x00]);
    // X86_64_RELOC_SIGNED l_.str
    let s_reloc_offset = main_data.len() - 4;
    // call puts
    main_data.extend_from_slice(&[0xe8, 0x00, 0x00, 0x00, 0x00]);
    // X86_64_RELOC_BRANCH _puts
    let puts_reloc_offset = main_data.len() - 4;
    // xor %eax, %eax; pop %rbp; ret
    main_data.extend_from_slice(&[0x31, 0xc0, 0x5d, 0xc3]);

    let text = obj.add_section(
        b"__TEXT".to_vec(),
        b"__text".to_vec(),
        macho::S_ATTR_PURE_INSTRUCTIONS | macho::S_ATTR_SOME_INSTRUCTIONS,
    );
    let main_offset = obj.append_section_data(text, &main_data, 4);
    obj.add_symbol(Symbol::new(
        &b"_main"[..],
        SymbolSection::Section(text),
        main_offset,
        true,
    ));

    // The string constant gets an assembler-local symbol so that the
    // relocation can refer to it.
    let cstring = obj.add_section(
        b"__TEXT".to_vec(),
        b"__cstring".to_vec(),
        macho::S_CSTRING_LITERALS,
    );
    let s_offset = obj.append_section_data(cstring, b"Hello, world!\0", 0);
    let s_symbol = obj.add_symbol(Symbol::new(
        &b"l_.str"[..],
        SymbolSection::Section(cstring),
        s_offset,
        false,
    ));

    // External symbol for puts.
    let puts_symbol = obj.add_symbol(Symbol::new(
        &b"_puts"[..],
        SymbolSection::Undefined,
        0,
        true,
    ));

    obj.add_relocation(
        text,
        Relocation::new(
            (main_offset as usize + s_reloc_offset) as u32,
            RelocationKind::X86_64(X86_64Reloc::Signed),
            RelocationTarget::Symbol(s_symbol),
        ),
    )?;
    obj.add_relocation(
        text,
        Relocation::new(
            (main_offset as usize + puts_reloc_offset) as u32,
            RelocationKind::X86_64(X86_64Reloc::Branch32),
            RelocationTarget::Symbol(puts_symbol),
        ),
    )?;

    // Finally, write the object file.
    let file = std::fs::File::create("hello.o")?;
    obj.write_stream(std::io::BufWriter::new(file))?;
    Ok(())
}
