use super::*;
use macho_object::macho::*;
use macho_object::names;
use macho_object::read::macho::{
    Dysymtab, DysymtabTables, Header, LoadCommand, LoadCommandVariant, MachOFatFile, MachOFile,
    MachOSection, MachOSegment, Symtab,
};
use macho_object::read::{SectionIndex, SymbolIndex};
use macho_object::reloc::RelocationTarget;
use macho_object::BigEndian;

macro_rules! xlat {
    ($($name:ident),+ $(,)?) => ( &[ $(Xlat { name: stringify!($name), value: $name as u32 }),+ ] )
}

pub(super) fn print_macho_fat(p: &mut Printer<'_>, data: &[u8]) {
    if let Some(fat) = MachOFatFile::parse(data).print_err(p) {
        writeln!(p.w(), "Format: Mach-O Fat 32-bit").unwrap();
        if p.options.file {
            let header = fat.header();
            p.group("FatHeader", |p| {
                p.field_hex("Magic", header.magic.get(BigEndian));
                p.field("NumberOfFatArch", header.nfat_arch.get(BigEndian));
            });
            for arch in fat.arches() {
                p.group("FatArch", |p| {
                    print_cputype(p, arch.cputype(), arch.cpusubtype());
                    p.field_hex("Offset", arch.offset());
                    p.field_hex("Size", arch.size());
                    p.field("Align", arch.align());
                });
            }
        }
        for member in fat.members() {
            if let Some(member) = member.print_err(p) {
                p.blank();
                print_object(p, member.data);
            }
        }
    }
}

pub(super) fn print_macho(p: &mut Printer<'_>, data: &[u8]) {
    if let Some(file) = MachOFile::parse(data).print_err(p) {
        if file.is_64() {
            writeln!(p.w(), "Format: Mach-O 64-bit").unwrap();
        } else {
            writeln!(p.w(), "Format: Mach-O 32-bit").unwrap();
        }
        print_mach_header(p, file.header());
        for command in file.commands() {
            print_load_command(p, &file, command);
        }
    }
}

fn print_mach_header(p: &mut Printer<'_>, header: &Header) {
    if !p.options.file {
        return;
    }
    p.group("MachHeader", |p| {
        p.field_hex("Magic", header.magic);
        print_cputype(p, header.cputype, header.cpusubtype);
        p.field_enum("FileType", header.filetype, names::FILE_TYPES);
        p.field("NumberOfCmds", header.ncmds);
        p.field_hex("SizeOfCmds", header.sizeofcmds);
        p.field_hex("Flags", header.flags);
        p.flags(header.flags, 0, names::HEADER_FLAGS);
    });
}

fn print_cputype(p: &mut Printer<'_>, cputype: u32, cpusubtype: u32) {
    p.field_enum("CpuType", cputype, names::CPU_TYPES);
    p.field_hex("CpuSubtype", cpusubtype);
    p.flags(cpusubtype, 0, FLAGS_CPU_SUBTYPE);
}

fn print_command_header(p: &mut Printer<'_>, command: &LoadCommand<'_>) {
    p.field_enum("Cmd", command.raw_cmd(), names::LOAD_COMMANDS);
    p.field_hex("CmdSize", command.len);
}

fn print_load_command(p: &mut Printer<'_>, file: &MachOFile<'_>, command: &LoadCommand<'_>) {
    match &command.variant {
        LoadCommandVariant::Segment(segment) => {
            print_segment(p, file, command, segment);
            return;
        }
        LoadCommandVariant::Symtab(symtab) => {
            print_symtab(p, file, command, symtab);
            return;
        }
        LoadCommandVariant::Dysymtab(dysymtab) => {
            print_dysymtab(p, file, command, dysymtab);
            return;
        }
        _ => {}
    }
    if !p.options.load_commands {
        return;
    }
    match &command.variant {
        LoadCommandVariant::Thread(thread) => {
            p.group("ThreadCommand", |p| {
                print_command_header(p, command);
                for state in &thread.states {
                    p.group("ThreadState", |p| {
                        p.field_hex("Flavor", state.flavor);
                        p.field("Count", state.count);
                    });
                }
                if let Some(pc) = thread.pc(file.architecture(), file.endianness()) {
                    p.field_hex("ProgramCounter", pc);
                }
            });
        }
        LoadCommandVariant::Dylib(dylib) => {
            p.group("DylibCommand", |p| {
                print_command_header(p, command);
                p.field_string("Name", dylib.name_offset, dylib.name);
                p.field("Timestamp", dylib.timestamp);
                p.field_hex("CurrentVersion", dylib.current_version);
                p.field_hex("CompatibilityVersion", dylib.compatibility_version);
            });
        }
        LoadCommandVariant::Dylinker(payload) => {
            p.group("DylinkerCommand", |p| {
                print_command_header(p, command);
                p.field_string("Name", payload.name_offset, payload.name);
            });
        }
        LoadCommandVariant::Str(payload) => {
            p.group("StringCommand", |p| {
                print_command_header(p, command);
                p.field_string("Name", payload.name_offset, payload.name);
            });
        }
        LoadCommandVariant::PreboundDylib(prebound) => {
            p.group("PreboundDylibCommand", |p| {
                print_command_header(p, command);
                p.field_string("Name", prebound.name_offset, prebound.name);
                p.field("NumberOfModules", prebound.nmodules);
                p.field_bytes("LinkedModules", prebound.linked_modules);
            });
        }
        LoadCommandVariant::Uuid(uuid) => {
            p.group("UuidCommand", |p| {
                print_command_header(p, command);
                p.field_bytes("Uuid", uuid);
            });
        }
        LoadCommandVariant::LinkeditData(linkedit) => {
            p.group("LinkeditDataCommand", |p| {
                print_command_header(p, command);
                p.field_hex("DataOffset", linkedit.dataoff);
                p.field_hex("DataSize", linkedit.datasize);
            });
        }
        LoadCommandVariant::DyldInfo(info) => {
            p.group("DyldInfoCommand", |p| {
                print_command_header(p, command);
                p.field_hex("RebaseOffset", info.rebase_off);
                p.field_hex("RebaseSize", info.rebase_size);
                p.field_hex("BindOffset", info.bind_off);
                p.field_hex("BindSize", info.bind_size);
                p.field_hex("WeakBindOffset", info.weak_bind_off);
                p.field_hex("WeakBindSize", info.weak_bind_size);
                p.field_hex("LazyBindOffset", info.lazy_bind_off);
                p.field_hex("LazyBindSize", info.lazy_bind_size);
                p.field_hex("ExportOffset", info.export_off);
                p.field_hex("ExportSize", info.export_size);
            });
        }
        LoadCommandVariant::VersionMin(version) => {
            p.group("VersionMinCommand", |p| {
                print_command_header(p, command);
                p.field("Version", format_version(version.version));
                p.field("Sdk", format_version(version.sdk));
            });
        }
        LoadCommandVariant::Main(entry) => {
            p.group("EntryPointCommand", |p| {
                print_command_header(p, command);
                p.field_hex("EntryOffset", entry.entryoff);
                p.field_hex("StackSize", entry.stacksize);
            });
        }
        LoadCommandVariant::SourceVersion(version) => {
            p.group("SourceVersionCommand", |p| {
                print_command_header(p, command);
                let version = *version;
                p.field(
                    "Version",
                    format!(
                        "{}.{}.{}.{}.{}",
                        version >> 40,
                        (version >> 30) & 0x3ff,
                        (version >> 20) & 0x3ff,
                        (version >> 10) & 0x3ff,
                        version & 0x3ff
                    ),
                );
            });
        }
        LoadCommandVariant::Fvmlib(fvmlib) => {
            p.group("FvmlibCommand", |p| {
                print_command_header(p, command);
                p.field_string("Name", fvmlib.name_offset, fvmlib.name);
                p.field_hex("MinorVersion", fvmlib.minor_version);
                p.field_hex("HeaderAddress", fvmlib.header_addr);
            });
        }
        LoadCommandVariant::EncryptionInfo(info) => {
            p.group("EncryptionInfoCommand", |p| {
                print_command_header(p, command);
                p.field_hex("CryptOffset", info.cryptoff);
                p.field_hex("CryptSize", info.cryptsize);
                p.field("CryptId", info.cryptid);
                if let Some(pad) = info.pad {
                    p.field_hex("Pad", pad);
                }
            });
        }
        _ => {
            p.group("LoadCommand", |p| {
                print_command_header(p, command);
                p.field_bytes("Data", command.data.get(8..).unwrap_or(&[]));
            });
        }
    }
}

fn format_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version >> 16,
        (version >> 8) & 0xff,
        version & 0xff
    )
}

fn print_segment(
    p: &mut Printer<'_>,
    file: &MachOFile<'_>,
    command: &LoadCommand<'_>,
    segment: &MachOSegment,
) {
    if !p.options.load_commands && !p.options.sections {
        return;
    }
    p.group("SegmentCommand", |p| {
        print_command_header(p, command);
        p.field_inline_string("SegmentName", segment.name());
        p.field_hex("VmAddress", segment.vmaddr);
        p.field_hex("VmSize", segment.vmsize);
        p.field_hex("FileOffset", segment.fileoff);
        p.field_hex("FileSize", segment.filesize);
        p.field_hex("MaxProt", segment.maxprot);
        p.flags(segment.maxprot, 0, names::VM_PROTECTIONS);
        p.field_hex("InitProt", segment.initprot);
        p.flags(segment.initprot, 0, names::VM_PROTECTIONS);
        p.field("NumberOfSections", segment.nsects);
        p.field_hex("Flags", segment.flags);
        p.flags(segment.flags, 0, FLAGS_SG);
        if p.options.sections {
            for section in file.segment_sections(segment) {
                print_section(p, file, section);
            }
        }
    });
}

fn print_section(p: &mut Printer<'_>, file: &MachOFile<'_>, section: &MachOSection) {
    p.group("Section", |p| {
        p.field("Index", section.index.0);
        p.field_inline_string("SectionName", section.name());
        p.field_inline_string("SegmentName", section.segment_name());
        p.field("PortableName", section.display_name());
        p.field_hex("Address", section.addr);
        p.field_hex("Size", section.size);
        p.field_hex("Offset", section.offset);
        p.field_hex("Align", section.align);
        p.field_hex("RelocationOffset", section.reloff);
        p.field_hex("NumberOfRelocations", section.nreloc);
        p.field_hex("Flags", section.flags);
        p.flags(section.flags, SECTION_TYPE, names::SECTION_TYPES);
        p.flags(section.flags & SECTION_ATTRIBUTES, 0, names::SECTION_ATTRIBUTES);
        p.field_hex("Reserved1", section.reserved1);
        p.field_hex("Reserved2", section.reserved2);
        p.field_hex("Reserved3", section.reserved3);
        print_relocations(p, file, section);
    });
}

fn print_relocations(p: &mut Printer<'_>, file: &MachOFile<'_>, section: &MachOSection) {
    if !p.options.relocations || section.nreloc == 0 {
        return;
    }
    let relocations = match file.relocations(section) {
        Ok(relocations) => relocations,
        Err(err) => {
            writeln!(p.e, "Error: {}", err).unwrap();
            // Fall back to the raw records.
            if let Some(infos) = file.relocation_infos(section).print_err(p) {
                for info in infos {
                    p.group("RelocationInfo", |p| {
                        p.field_hex("Address", info.address);
                        p.field("Scattered", info.scattered);
                        p.field("Type", info.r_type);
                        p.field("Length", info.length);
                        p.field("PcRel", info.pcrel);
                    });
                }
            }
            return;
        }
    };
    for relocation in &relocations {
        p.group("Relocation", |p| {
            let info = &relocation.info;
            p.field_hex("Address", relocation.address);
            if info.scattered {
                p.field("Scattered", true);
                p.field_hex("Value", info.value);
            } else {
                p.field("Extern", info.r_extern);
                p.field("SymbolNumber", info.symbolnum);
            }
            p.field("Length", info.length);
            p.field("PcRel", info.pcrel);
            p.field("Type", info.r_type);
            p.field("Kind", relocation.howto().name);
            match relocation.target {
                RelocationTarget::Symbol(index) => {
                    let name = file
                        .symbol_by_index(SymbolIndex(index as usize))
                        .map(|symbol| symbol.name)
                        .unwrap_or(&[]);
                    p.field_string("Symbol", index, name);
                }
                RelocationTarget::Section(index) => {
                    let name = file
                        .section_by_index(SectionIndex(index as usize))
                        .map(|section| section.name())
                        .unwrap_or(&[]);
                    p.field_string("Section", index, name);
                }
                RelocationTarget::Absolute => p.field("Target", "Absolute"),
                RelocationTarget::Undefined => p.field("Target", "Undefined"),
            }
            p.field("Addend", relocation.addend);
        });
    }
}

fn print_symtab(
    p: &mut Printer<'_>,
    file: &MachOFile<'_>,
    command: &LoadCommand<'_>,
    symtab: &Symtab,
) {
    if !p.options.load_commands && !p.options.symbols {
        return;
    }
    p.group("SymtabCommand", |p| {
        print_command_header(p, command);
        p.field_hex("SymbolOffset", symtab.symoff);
        p.field("NumberOfSymbols", symtab.nsyms);
        p.field_hex("StringOffset", symtab.stroff);
        p.field_hex("StringSize", symtab.strsize);
        print_symbols(p, file);
    });
}

fn print_symbols(p: &mut Printer<'_>, file: &MachOFile<'_>) {
    if !p.options.symbols {
        return;
    }
    let symbols = match file.symbols().print_err(p) {
        Some(symbols) => symbols,
        None => return,
    };
    for symbol in symbols.symbols() {
        p.group("Nlist", |p| {
            p.field("Index", symbol.index.0);
            p.field_string("String", symbol.n_strx, symbol.name);
            let n_type = u32::from(symbol.n_type);
            p.field_hex("Type", n_type);
            if !symbol.debugging {
                p.flags(n_type, u32::from(N_TYPE), FLAGS_N_TYPE);
                p.flags(n_type & u32::from(N_EXT | N_PEXT), 0, FLAGS_N_EXT);
            }
            match file.sections().get(usize::from(symbol.n_sect).wrapping_sub(1)) {
                Some(section) => p.field_string("Section", symbol.n_sect, section.name()),
                None => p.field_hex("Section", symbol.n_sect),
            }
            let n_desc = u32::from(symbol.n_desc);
            p.field_hex("Desc", n_desc);
            if !symbol.debugging {
                if symbol.is_undefined() {
                    p.flags(n_desc, u32::from(REFERENCE_TYPE), FLAGS_REFERENCE);
                }
                p.flags(n_desc & !u32::from(REFERENCE_TYPE), 0, FLAGS_N_DESC);
            }
            p.field_hex("Value", symbol.n_value);
        });
    }
    if let Some(stubs) = file.stub_symbols().print_err(p) {
        for stub in stubs {
            p.group("StubSymbol", |p| {
                p.field_inline_string("Name", &stub.name);
                p.field("Section", stub.section.0);
                p.field_hex("Address", stub.address);
                p.field("Symbol", stub.symbol.0);
            });
        }
    }
}

fn print_dysymtab(
    p: &mut Printer<'_>,
    file: &MachOFile<'_>,
    command: &LoadCommand<'_>,
    x: &Dysymtab,
) {
    if !p.options.load_commands && !p.options.dysymtab {
        return;
    }
    p.group("DysymtabCommand", |p| {
        print_command_header(p, command);
        p.field("IndexOfLocalSymbols", x.ilocalsym);
        p.field("NumberOfLocalSymbols", x.nlocalsym);
        p.field("IndexOfExternallyDefinedSymbols", x.iextdefsym);
        p.field("NumberOfExternallyDefinedSymbols", x.nextdefsym);
        p.field("IndexOfUndefinedSymbols", x.iundefsym);
        p.field("NumberOfUndefinedSymbols", x.nundefsym);
        p.field_hex("TocOffset", x.tocoff);
        p.field("NumberOfTocEntries", x.ntoc);
        p.field_hex("ModuleTableOffset", x.modtaboff);
        p.field("NumberOfModuleTableEntries", x.nmodtab);
        p.field_hex("ExternalRefSymbolOffset", x.extrefsymoff);
        p.field("NumberOfExternalRefSymbols", x.nextrefsyms);
        p.field_hex("IndirectSymbolOffset", x.indirectsymoff);
        p.field("NumberOfIndirectSymbols", x.nindirectsyms);
        p.field_hex("ExternalRelocationOffset", x.extreloff);
        p.field("NumberOfExternalRelocations", x.nextrel);
        p.field_hex("LocalRelocationOffset", x.locreloff);
        p.field("NumberOfLocalRelocations", x.nlocrel);
        if p.options.dysymtab {
            if let Some(Some(tables)) = file.dysymtab().print_err(p) {
                print_dysymtab_tables(p, file, tables);
            }
        }
    });
}

fn print_dysymtab_tables(p: &mut Printer<'_>, file: &MachOFile<'_>, tables: &DysymtabTables) {
    for entry in &tables.toc {
        p.group("TocEntry", |p| {
            p.field("SymbolIndex", entry.symbol_index);
            p.field("ModuleIndex", entry.module_index);
        });
    }
    for module in &tables.modules {
        p.group("Module", |p| {
            p.field_hex("ModuleName", module.module_name);
            p.field("IndexOfExternallyDefinedSymbols", module.iextdefsym);
            p.field("NumberOfExternallyDefinedSymbols", module.nextdefsym);
            p.field("IndexOfReferences", module.irefsym);
            p.field("NumberOfReferences", module.nrefsym);
            p.field("IndexOfLocalSymbols", module.ilocalsym);
            p.field("NumberOfLocalSymbols", module.nlocalsym);
            p.field("IndexOfExternalRelocations", module.iextrel);
            p.field("NumberOfExternalRelocations", module.nextrel);
        });
    }
    for reference in &tables.external_refs {
        p.group("ExternalReference", |p| {
            p.field("SymbolIndex", reference.isym);
            p.field_enum("Flags", u32::from(reference.flags), FLAGS_REFERENCE);
        });
    }
    for (index, &entry) in tables.indirect_symbols.iter().enumerate() {
        p.group("IndirectSymbol", |p| {
            p.field("Index", index);
            if entry & (INDIRECT_SYMBOL_LOCAL | INDIRECT_SYMBOL_ABS) != 0 {
                p.field_hex("Symbol", entry);
                p.flags(entry, 0, FLAGS_INDIRECT_SYMBOL);
            } else {
                let name = file
                    .symbol_by_index(SymbolIndex(entry as usize))
                    .map(|symbol| symbol.name)
                    .unwrap_or(&[]);
                p.field_string("Symbol", entry, name);
            }
        });
    }
}

const FLAGS_CPU_SUBTYPE: &[Xlat] = xlat!(CPU_SUBTYPE_LIB64);
const FLAGS_SG: &[Xlat] = xlat!(SG_HIGHVM, SG_FVMLIB, SG_NORELOC, SG_PROTECTED_VERSION_1);
const FLAGS_N_TYPE: &[Xlat] = xlat!(N_UNDF, N_ABS, N_SECT, N_PBUD, N_INDR);
const FLAGS_N_EXT: &[Xlat] = xlat!(N_PEXT, N_EXT);
const FLAGS_REFERENCE: &[Xlat] = xlat!(
    REFERENCE_FLAG_UNDEFINED_NON_LAZY,
    REFERENCE_FLAG_UNDEFINED_LAZY,
    REFERENCE_FLAG_DEFINED,
    REFERENCE_FLAG_PRIVATE_DEFINED,
    REFERENCE_FLAG_PRIVATE_UNDEFINED_NON_LAZY,
    REFERENCE_FLAG_PRIVATE_UNDEFINED_LAZY,
);
const FLAGS_N_DESC: &[Xlat] = xlat!(
    REFERENCED_DYNAMICALLY,
    N_NO_DEAD_STRIP,
    N_WEAK_REF,
    N_WEAK_DEF,
    N_ARM_THUMB_DEF,
    N_ALT_ENTRY,
);
const FLAGS_INDIRECT_SYMBOL: &[Xlat] = xlat!(INDIRECT_SYMBOL_LOCAL, INDIRECT_SYMBOL_ABS);
