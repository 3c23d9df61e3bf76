//! Name tables for Mach-O constants, and the translation between Mach-O
//! `(segname, sectname)` pairs and portable section names.
//!
//! All tables are immutable statics and may be shared between threads.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;

use crate::common::{Arch, SectionFlags, SectionKind};
use crate::macho;

/// A `(name, value)` entry in a constant name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xlat {
    /// The printable name.
    pub name: &'static str,
    /// The raw value.
    pub value: u32,
}

macro_rules! xlat {
    ($($name:ident),+ $(,)?) => {
        &[$(Xlat { name: stringify!($name), value: macho::$name as u32 }),+]
    };
}

/// Names of the `CPU_TYPE_*` values.
pub static CPU_TYPES: &[Xlat] = &[
    Xlat { name: "vax", value: macho::CPU_TYPE_VAX },
    Xlat { name: "mc680x0", value: macho::CPU_TYPE_MC680X0 },
    Xlat { name: "i386", value: macho::CPU_TYPE_X86 },
    Xlat { name: "x86_64", value: macho::CPU_TYPE_X86_64 },
    Xlat { name: "mips", value: macho::CPU_TYPE_MIPS },
    Xlat { name: "mc98000", value: macho::CPU_TYPE_MC98000 },
    Xlat { name: "hppa", value: macho::CPU_TYPE_HPPA },
    Xlat { name: "arm", value: macho::CPU_TYPE_ARM },
    Xlat { name: "arm64", value: macho::CPU_TYPE_ARM64 },
    Xlat { name: "arm64_32", value: macho::CPU_TYPE_ARM64_32 },
    Xlat { name: "mc88000", value: macho::CPU_TYPE_MC88000 },
    Xlat { name: "sparc", value: macho::CPU_TYPE_SPARC },
    Xlat { name: "i860", value: macho::CPU_TYPE_I860 },
    Xlat { name: "alpha", value: macho::CPU_TYPE_ALPHA },
    Xlat { name: "powerpc", value: macho::CPU_TYPE_POWERPC },
    Xlat { name: "powerpc_64", value: macho::CPU_TYPE_POWERPC64 },
];

/// Names of the `MH_*` file types.
pub static FILE_TYPES: &[Xlat] = &[
    Xlat { name: "object", value: macho::MH_OBJECT },
    Xlat { name: "execute", value: macho::MH_EXECUTE },
    Xlat { name: "fvmlib", value: macho::MH_FVMLIB },
    Xlat { name: "core", value: macho::MH_CORE },
    Xlat { name: "preload", value: macho::MH_PRELOAD },
    Xlat { name: "dylib", value: macho::MH_DYLIB },
    Xlat { name: "dylinker", value: macho::MH_DYLINKER },
    Xlat { name: "bundle", value: macho::MH_BUNDLE },
    Xlat { name: "dylib_stub", value: macho::MH_DYLIB_STUB },
    Xlat { name: "dsym", value: macho::MH_DSYM },
    Xlat { name: "kext_bundle", value: macho::MH_KEXT_BUNDLE },
    Xlat { name: "fileset", value: macho::MH_FILESET },
];

/// Names of the header flag bits.
pub static HEADER_FLAGS: &[Xlat] = xlat!(
    MH_NOUNDEFS,
    MH_INCRLINK,
    MH_DYLDLINK,
    MH_BINDATLOAD,
    MH_PREBOUND,
    MH_SPLIT_SEGS,
    MH_LAZY_INIT,
    MH_TWOLEVEL,
    MH_FORCE_FLAT,
    MH_NOMULTIDEFS,
    MH_NOFIXPREBINDING,
    MH_PREBINDABLE,
    MH_ALLMODSBOUND,
    MH_SUBSECTIONS_VIA_SYMBOLS,
    MH_CANONICAL,
    MH_WEAK_DEFINES,
    MH_BINDS_TO_WEAK,
    MH_ALLOW_STACK_EXECUTION,
    MH_ROOT_SAFE,
    MH_SETUID_SAFE,
    MH_NO_REEXPORTED_DYLIBS,
    MH_PIE,
    MH_DEAD_STRIPPABLE_DYLIB,
    MH_HAS_TLV_DESCRIPTORS,
    MH_NO_HEAP_EXECUTION,
    MH_APP_EXTENSION_SAFE,
);

/// Names of the section types.
pub static SECTION_TYPES: &[Xlat] = xlat!(
    S_REGULAR,
    S_ZEROFILL,
    S_CSTRING_LITERALS,
    S_4BYTE_LITERALS,
    S_8BYTE_LITERALS,
    S_LITERAL_POINTERS,
    S_NON_LAZY_SYMBOL_POINTERS,
    S_LAZY_SYMBOL_POINTERS,
    S_SYMBOL_STUBS,
    S_MOD_INIT_FUNC_POINTERS,
    S_MOD_TERM_FUNC_POINTERS,
    S_COALESCED,
    S_GB_ZEROFILL,
    S_INTERPOSING,
    S_16BYTE_LITERALS,
    S_DTRACE_DOF,
    S_LAZY_DYLIB_SYMBOL_POINTERS,
    S_THREAD_LOCAL_REGULAR,
    S_THREAD_LOCAL_ZEROFILL,
    S_THREAD_LOCAL_VARIABLES,
    S_THREAD_LOCAL_VARIABLE_POINTERS,
    S_THREAD_LOCAL_INIT_FUNCTION_POINTERS,
    S_INIT_FUNC_OFFSETS,
);

/// Names of the section attribute bits.
pub static SECTION_ATTRIBUTES: &[Xlat] = xlat!(
    S_ATTR_PURE_INSTRUCTIONS,
    S_ATTR_NO_TOC,
    S_ATTR_STRIP_STATIC_SYMS,
    S_ATTR_NO_DEAD_STRIP,
    S_ATTR_LIVE_SUPPORT,
    S_ATTR_SELF_MODIFYING_CODE,
    S_ATTR_DEBUG,
    S_ATTR_SOME_INSTRUCTIONS,
    S_ATTR_EXT_RELOC,
    S_ATTR_LOC_RELOC,
);

/// Names of the load command types.
///
/// The values include the `LC_REQ_DYLD` bit where the command requires it.
pub static LOAD_COMMANDS: &[Xlat] = xlat!(
    LC_SEGMENT,
    LC_SYMTAB,
    LC_SYMSEG,
    LC_THREAD,
    LC_UNIXTHREAD,
    LC_LOADFVMLIB,
    LC_IDFVMLIB,
    LC_IDENT,
    LC_FVMFILE,
    LC_PREPAGE,
    LC_DYSYMTAB,
    LC_LOAD_DYLIB,
    LC_ID_DYLIB,
    LC_LOAD_DYLINKER,
    LC_ID_DYLINKER,
    LC_PREBOUND_DYLIB,
    LC_ROUTINES,
    LC_SUB_FRAMEWORK,
    LC_SUB_UMBRELLA,
    LC_SUB_CLIENT,
    LC_SUB_LIBRARY,
    LC_TWOLEVEL_HINTS,
    LC_PREBIND_CKSUM,
    LC_LOAD_WEAK_DYLIB,
    LC_SEGMENT_64,
    LC_ROUTINES_64,
    LC_UUID,
    LC_RPATH,
    LC_CODE_SIGNATURE,
    LC_SEGMENT_SPLIT_INFO,
    LC_REEXPORT_DYLIB,
    LC_LAZY_LOAD_DYLIB,
    LC_ENCRYPTION_INFO,
    LC_DYLD_INFO,
    LC_DYLD_INFO_ONLY,
    LC_LOAD_UPWARD_DYLIB,
    LC_VERSION_MIN_MACOSX,
    LC_VERSION_MIN_IPHONEOS,
    LC_FUNCTION_STARTS,
    LC_DYLD_ENVIRONMENT,
    LC_MAIN,
    LC_DATA_IN_CODE,
    LC_SOURCE_VERSION,
    LC_DYLIB_CODE_SIGN_DRS,
    LC_ENCRYPTION_INFO_64,
    LC_LINKER_OPTION,
    LC_LINKER_OPTIMIZATION_HINT,
    LC_VERSION_MIN_TVOS,
    LC_VERSION_MIN_WATCHOS,
    LC_NOTE,
    LC_BUILD_VERSION,
);

/// Names of the VM protection bits.
pub static VM_PROTECTIONS: &[Xlat] = xlat!(VM_PROT_READ, VM_PROT_WRITE, VM_PROT_EXECUTE);

/// Find the name of `value` in `table`.
pub fn name(table: &'static [Xlat], value: u32) -> Option<&'static str> {
    table.iter().find(|x| x.value == value).map(|x| x.name)
}

/// Find the value of `name` in `table`.
pub fn value(table: &'static [Xlat], name: &str) -> Option<u32> {
    table.iter().find(|x| x.name == name).map(|x| x.value)
}

/// Return the name of a cpu type.
pub fn cpu_type_name(cputype: u32) -> Option<&'static str> {
    name(CPU_TYPES, cputype)
}

/// Return the name of a file type.
pub fn file_type_name(filetype: u32) -> Option<&'static str> {
    name(FILE_TYPES, filetype)
}

/// Return the name of a load command.
///
/// `cmd` is the raw command value, including the `LC_REQ_DYLD` bit.
pub fn load_command_name(cmd: u32) -> Option<&'static str> {
    name(LOAD_COMMANDS, cmd)
}

/// Return the name of the type part of section flags.
pub fn section_type_name(flags: u32) -> Option<&'static str> {
    name(SECTION_TYPES, flags & macho::SECTION_TYPE)
}

/// One row of a section name translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionName {
    /// The portable name.
    pub portable: &'static str,
    /// The Mach-O segment name.
    pub segment: &'static str,
    /// The Mach-O section name.
    pub section: &'static str,
    /// The portable flags.
    pub flags: SectionFlags,
    /// The Mach-O section type.
    pub section_type: u32,
    /// The Mach-O section attributes.
    pub attributes: u32,
    /// The default alignment as a power of 2.
    pub align: u32,
}

impl SectionName {
    /// The Mach-O section flags: the type combined with the attributes.
    #[inline]
    pub fn macho_flags(&self) -> u32 {
        self.section_type | self.attributes
    }
}

const CODE: SectionFlags = SectionFlags::CODE;
const DATA: SectionFlags = SectionFlags::DATA;
const READONLY: SectionFlags = SectionFlags::READONLY;
const LOAD: SectionFlags = SectionFlags::LOAD;
const ALLOC: SectionFlags = SectionFlags::ALLOC;
const DEBUGGING: SectionFlags = SectionFlags::DEBUGGING;

const fn flags(bits: &[SectionFlags]) -> SectionFlags {
    let mut value = 0;
    let mut i = 0;
    while i < bits.len() {
        value |= bits[i].bits();
        i += 1;
    }
    SectionFlags::from_bits(value)
}

macro_rules! section {
    ($portable:expr, $segment:expr, $section:expr, [$($flag:ident),*], $ty:ident, $attrs:expr, $align:expr) => {
        SectionName {
            portable: $portable,
            segment: $segment,
            section: $section,
            flags: flags(&[$($flag),*]),
            section_type: macho::$ty,
            attributes: $attrs,
            align: $align,
        }
    };
}

const DEBUG_ATTR: u32 = macho::S_ATTR_DEBUG;
const PURE: u32 = macho::S_ATTR_PURE_INSTRUCTIONS;
const SOME: u32 = macho::S_ATTR_SOME_INSTRUCTIONS;

static TEXT_SECTIONS: &[SectionName] = &[
    section!(".text", "__TEXT", "__text", [CODE, LOAD], S_REGULAR, PURE, 0),
    section!(".const", "__TEXT", "__const", [READONLY, DATA, LOAD], S_REGULAR, 0, 0),
    section!(".static_const", "__TEXT", "__static_const", [READONLY, DATA, LOAD], S_REGULAR, 0, 0),
    section!(
        ".cstring",
        "__TEXT",
        "__cstring",
        [READONLY, DATA, LOAD, MERGE, STRINGS],
        S_CSTRING_LITERALS,
        0,
        0
    ),
    section!(".literal4", "__TEXT", "__literal4", [READONLY, DATA, LOAD], S_4BYTE_LITERALS, 0, 2),
    section!(".literal8", "__TEXT", "__literal8", [READONLY, DATA, LOAD], S_8BYTE_LITERALS, 0, 3),
    section!(".literal16", "__TEXT", "__literal16", [READONLY, DATA, LOAD], S_16BYTE_LITERALS, 0, 4),
    section!(".constructor", "__TEXT", "__constructor", [CODE, LOAD], S_REGULAR, 0, 0),
    section!(".destructor", "__TEXT", "__destructor", [CODE, LOAD], S_REGULAR, 0, 0),
    section!(
        ".eh_frame",
        "__TEXT",
        "__eh_frame",
        [READONLY, DATA, LOAD],
        S_COALESCED,
        macho::S_ATTR_LIVE_SUPPORT | macho::S_ATTR_STRIP_STATIC_SYMS | macho::S_ATTR_NO_TOC,
        2
    ),
    section!(
        ".gcc_except_tab",
        "__TEXT",
        "__gcc_except_tab",
        [READONLY, DATA, LOAD],
        S_REGULAR,
        0,
        2
    ),
    section!(".unwind_info", "__TEXT", "__unwind_info", [READONLY, DATA, LOAD], S_REGULAR, 0, 2),
];

static DATA_SECTIONS: &[SectionName] = &[
    section!(".data", "__DATA", "__data", [DATA, LOAD], S_REGULAR, 0, 0),
    section!(".bss", "__DATA", "__bss", [ALLOC], S_ZEROFILL, 0, 0),
    section!(".common", "__DATA", "__common", [ALLOC], S_ZEROFILL, 0, 0),
    section!(".const_data", "__DATA", "__const", [DATA, LOAD], S_REGULAR, 0, 0),
    section!(".static_data", "__DATA", "__static_data", [DATA, LOAD], S_REGULAR, 0, 0),
    section!(
        ".mod_init_func",
        "__DATA",
        "__mod_init_func",
        [DATA, LOAD],
        S_MOD_INIT_FUNC_POINTERS,
        0,
        2
    ),
    section!(
        ".mod_term_func",
        "__DATA",
        "__mod_term_func",
        [DATA, LOAD],
        S_MOD_TERM_FUNC_POINTERS,
        0,
        2
    ),
    section!(".dyld", "__DATA", "__dyld", [DATA, LOAD], S_REGULAR, 0, 0),
    section!(".cfstring", "__DATA", "__cfstring", [DATA, LOAD], S_REGULAR, 0, 2),
    section!(".tdata", "__DATA", "__thread_data", [DATA, LOAD], S_THREAD_LOCAL_REGULAR, 0, 0),
    section!(".tbss", "__DATA", "__thread_bss", [ALLOC], S_THREAD_LOCAL_ZEROFILL, 0, 0),
    section!(".tvars", "__DATA", "__thread_vars", [DATA, LOAD], S_THREAD_LOCAL_VARIABLES, 0, 0),
];

static DWARF_SECTIONS: &[SectionName] = &[
    section!(".debug_frame", "__DWARF", "__debug_frame", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_info", "__DWARF", "__debug_info", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_abbrev", "__DWARF", "__debug_abbrev", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_aranges", "__DWARF", "__debug_aranges", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_macinfo", "__DWARF", "__debug_macinfo", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_line", "__DWARF", "__debug_line", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_loc", "__DWARF", "__debug_loc", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_pubnames", "__DWARF", "__debug_pubnames", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_pubtypes", "__DWARF", "__debug_pubtypes", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_str", "__DWARF", "__debug_str", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_ranges", "__DWARF", "__debug_ranges", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_macro", "__DWARF", "__debug_macro", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
    section!(".debug_gdb_scripts", "__DWARF", "__debug_gdb_scri", [DEBUGGING], S_REGULAR, DEBUG_ATTR, 0),
];

static OBJC_SECTIONS: &[SectionName] = &[
    section!(".objc_class", "__OBJC", "__class", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_meta_class", "__OBJC", "__meta_class", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_cat_cls_meth", "__OBJC", "__cat_cls_meth", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_cat_inst_meth", "__OBJC", "__cat_inst_meth", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_protocol", "__OBJC", "__protocol", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_string_object", "__OBJC", "__string_object", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_cls_meth", "__OBJC", "__cls_meth", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_inst_meth", "__OBJC", "__inst_meth", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_cls_refs", "__OBJC", "__cls_refs", [DATA, LOAD], S_LITERAL_POINTERS, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_message_refs", "__OBJC", "__message_refs", [DATA, LOAD], S_LITERAL_POINTERS, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_symbols", "__OBJC", "__symbols", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_category", "__OBJC", "__category", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_class_vars", "__OBJC", "__class_vars", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_instance_vars", "__OBJC", "__instance_vars", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_module_info", "__OBJC", "__module_info", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_selector_strs", "__OBJC", "__selector_strs", [DATA, LOAD], S_CSTRING_LITERALS, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_image_info", "__OBJC", "__image_info", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc_selector_fixup", "__OBJC", "__sel_fixup", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc1_class_ext", "__OBJC", "__class_ext", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc1_property_list", "__OBJC", "__property", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
    section!(".objc1_protocol_ext", "__OBJC", "__protocol_ext", [DATA, LOAD], S_REGULAR, macho::S_ATTR_NO_DEAD_STRIP, 0),
];

/// The generic tables, in lookup order.
static GENERIC_SECTIONS: &[&[SectionName]] =
    &[TEXT_SECTIONS, DATA_SECTIONS, DWARF_SECTIONS, OBJC_SECTIONS];

static X86_SECTIONS: &[SectionName] = &[
    section!(".symbol_stub", "__TEXT", "__symbol_stub", [CODE, LOAD], S_SYMBOL_STUBS, PURE | SOME, 0),
    section!(".picsymbol_stub", "__TEXT", "__picsymbol_stub", [CODE, LOAD], S_SYMBOL_STUBS, PURE | SOME, 0),
    section!(".stub_helper", "__TEXT", "__stub_helper", [CODE, LOAD], S_REGULAR, PURE | SOME, 0),
    section!(".non_lazy_symbol_pointer", "__DATA", "__nl_symbol_ptr", [DATA, LOAD], S_NON_LAZY_SYMBOL_POINTERS, 0, 2),
    section!(".lazy_symbol_pointer", "__DATA", "__la_symbol_ptr", [DATA, LOAD], S_LAZY_SYMBOL_POINTERS, 0, 2),
    section!(".lazy_symbol_pointer2", "__DATA", "__la_sym_ptr2", [DATA, LOAD], S_LAZY_SYMBOL_POINTERS, 0, 2),
    section!(".lazy_symbol_pointer3", "__DATA", "__la_sym_ptr3", [DATA, LOAD], S_LAZY_SYMBOL_POINTERS, 0, 2),
    section!(
        ".jump_table",
        "__IMPORT",
        "__jump_table",
        [CODE, LOAD],
        S_SYMBOL_STUBS,
        macho::S_ATTR_SELF_MODIFYING_CODE | SOME,
        6
    ),
    section!(".pointers", "__IMPORT", "__pointers", [DATA, LOAD], S_NON_LAZY_SYMBOL_POINTERS, 0, 2),
];

static ARM64_SECTIONS: &[SectionName] = &[
    section!(".stubs", "__TEXT", "__stubs", [CODE, LOAD], S_SYMBOL_STUBS, PURE | SOME, 2),
    section!(".stub_helper", "__TEXT", "__stub_helper", [CODE, LOAD], S_REGULAR, PURE | SOME, 2),
    section!(".got", "__DATA", "__got", [DATA, LOAD], S_NON_LAZY_SYMBOL_POINTERS, 0, 3),
    section!(".lazy_symbol_pointer", "__DATA", "__la_symbol_ptr", [DATA, LOAD], S_LAZY_SYMBOL_POINTERS, 0, 3),
];

static ARM_SECTIONS: &[SectionName] = &[
    section!(".symbol_stub", "__TEXT", "__symbolstub1", [CODE, LOAD], S_SYMBOL_STUBS, PURE | SOME, 2),
    section!(".non_lazy_symbol_pointer", "__DATA", "__nl_symbol_ptr", [DATA, LOAD], S_NON_LAZY_SYMBOL_POINTERS, 0, 2),
    section!(".lazy_symbol_pointer", "__DATA", "__la_symbol_ptr", [DATA, LOAD], S_LAZY_SYMBOL_POINTERS, 0, 2),
];

const MERGE: SectionFlags = SectionFlags::MERGE;
const STRINGS: SectionFlags = SectionFlags::STRINGS;

/// Return the architecture specific table, which has priority over the
/// generic tables.
pub fn arch_sections(arch: Arch) -> &'static [SectionName] {
    match arch {
        Arch::I386 | Arch::X86_64 => X86_SECTIONS,
        Arch::Arm64 => ARM64_SECTIONS,
        Arch::Arm => ARM_SECTIONS,
        Arch::Generic => &[],
    }
}

/// Iterate over all table entries in lookup priority order.
pub fn all_sections(arch: Arch) -> impl Iterator<Item = &'static SectionName> {
    arch_sections(arch)
        .iter()
        .chain(GENERIC_SECTIONS.iter().flat_map(|table| table.iter()))
}

/// Find the table entry for a Mach-O section.
pub fn find_by_macho(arch: Arch, segname: &[u8], sectname: &[u8]) -> Option<&'static SectionName> {
    all_sections(arch)
        .find(|entry| entry.segment.as_bytes() == segname && entry.section.as_bytes() == sectname)
}

/// Find the table entry for a portable section name.
pub fn find_by_portable(arch: Arch, name: &str) -> Option<&'static SectionName> {
    all_sections(arch).find(|entry| entry.portable == name)
}

const SEGMENT_PREFIX: &str = "LC_SEGMENT.";

/// The portable view of a Mach-O section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableSection {
    /// The portable name.
    pub name: Cow<'static, str>,
    /// The portable flags.
    pub flags: SectionFlags,
    /// The section kind.
    pub kind: SectionKind,
    /// The table entry, if the name is a well-known one.
    pub entry: Option<&'static SectionName>,
}

/// Translate a Mach-O `(segname, sectname)` pair to a portable section.
///
/// `macho_flags` are the section flags and `initprot` is the initial
/// protection of the containing segment; both are only used to guess the
/// portable flags of sections that are not in the tables.
pub fn from_macho(
    arch: Arch,
    segname: &[u8],
    sectname: &[u8],
    macho_flags: u32,
    initprot: u32,
) -> PortableSection {
    if let Some(entry) = find_by_macho(arch, segname, sectname) {
        return PortableSection {
            name: Cow::Borrowed(entry.portable),
            flags: entry.flags,
            kind: SectionKind::from_flags(macho_flags, entry.flags),
            entry: Some(entry),
        };
    }

    let segment = String::from_utf8_lossy(segname);
    let section = String::from_utf8_lossy(sectname);
    let name = if segname.first() == Some(&b'_') {
        format!("{}.{}", segment, section)
    } else {
        format!("{}{}.{}", SEGMENT_PREFIX, segment, section)
    };
    let flags = guess_flags(macho_flags, initprot);
    PortableSection {
        name: Cow::Owned(name),
        flags,
        kind: SectionKind::from_flags(macho_flags, flags),
        entry: None,
    }
}

/// Guess the portable flags of a section that is not in the tables.
pub fn guess_flags(macho_flags: u32, initprot: u32) -> SectionFlags {
    if macho_flags & macho::S_ATTR_DEBUG != 0 {
        return SectionFlags::DEBUGGING;
    }
    let mut flags = SectionFlags::ALLOC;
    match macho_flags & macho::SECTION_TYPE {
        macho::S_ZEROFILL | macho::S_GB_ZEROFILL | macho::S_THREAD_LOCAL_ZEROFILL => {
            return flags
        }
        _ => {}
    }
    flags |= SectionFlags::LOAD;
    if initprot & macho::VM_PROT_EXECUTE != 0 {
        flags |= SectionFlags::CODE;
    }
    if initprot & macho::VM_PROT_WRITE != 0 {
        flags |= SectionFlags::DATA;
    } else if initprot & macho::VM_PROT_READ != 0 {
        flags |= SectionFlags::READONLY;
    }
    flags
}

/// Guess the Mach-O section flags for portable flags.
pub fn guess_macho_flags(flags: SectionFlags) -> u32 {
    if flags.contains(SectionFlags::DEBUGGING) {
        macho::S_REGULAR | macho::S_ATTR_DEBUG
    } else if flags.contains(SectionFlags::CODE) {
        macho::S_REGULAR | macho::S_ATTR_PURE_INSTRUCTIONS | macho::S_ATTR_SOME_INSTRUCTIONS
    } else if !flags.contains(SectionFlags::LOAD) && flags.contains(SectionFlags::ALLOC) {
        macho::S_ZEROFILL
    } else if flags.contains(SectionFlags::STRINGS) {
        macho::S_CSTRING_LITERALS
    } else {
        macho::S_REGULAR
    }
}

/// The Mach-O names of a portable section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachOSectionName {
    /// The segment name, NUL padded.
    pub segname: [u8; 16],
    /// The section name, NUL padded.
    pub sectname: [u8; 16],
    /// The table entry, if the name is a well-known one.
    pub entry: Option<&'static SectionName>,
}

impl MachOSectionName {
    /// Return the segment name without padding.
    pub fn segment(&self) -> &[u8] {
        trim_name(&self.segname)
    }

    /// Return the section name without padding.
    pub fn section(&self) -> &[u8] {
        trim_name(&self.sectname)
    }
}

/// Translate a portable section name to a Mach-O `(segname, sectname)` pair.
pub fn to_macho(arch: Arch, name: &str) -> MachOSectionName {
    if let Some(entry) = find_by_portable(arch, name) {
        return MachOSectionName {
            segname: pad_name(entry.segment.as_bytes()),
            sectname: pad_name(entry.section.as_bytes()),
            entry: Some(entry),
        };
    }

    let name = name.strip_prefix(SEGMENT_PREFIX).unwrap_or(name).as_bytes();
    if let Some(dot) = name.iter().position(|&c| c == b'.') {
        let (segment, section) = (&name[..dot], &name[dot + 1..]);
        if dot != 0 && segment.len() <= 16 && section.len() <= 16 {
            return MachOSectionName {
                segname: pad_name(segment),
                sectname: pad_name(section),
                entry: None,
            };
        }
    }
    // The segment and section names are both the same.
    let name = pad_name(name);
    MachOSectionName {
        segname: name,
        sectname: name,
        entry: None,
    }
}

/// Copy a name into a NUL padded 16 byte field, truncating if needed.
pub fn pad_name(name: &[u8]) -> [u8; 16] {
    let mut out = [0; 16];
    let len = name.len().min(16);
    out[..len].copy_from_slice(&name[..len]);
    out
}

/// Return the bytes of a 16 byte name field up until the first NUL.
pub fn trim_name(name: &[u8; 16]) -> &[u8] {
    match memchr::memchr(b'\0', name) {
        Some(end) => &name[..end],
        None => &name[..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHES: [Arch; 5] = [Arch::Arm, Arch::Arm64, Arch::I386, Arch::X86_64, Arch::Generic];

    #[test]
    fn table_names_round_trip() {
        for arch in ARCHES {
            for entry in all_sections(arch) {
                let macho = to_macho(arch, entry.portable);
                // Another entry with the same portable name may shadow this one.
                let winner = find_by_portable(arch, entry.portable).unwrap();
                assert_eq!(macho.segment(), winner.segment.as_bytes());
                assert_eq!(macho.section(), winner.section.as_bytes());

                let winner = find_by_macho(arch, entry.segment.as_bytes(), entry.section.as_bytes())
                    .unwrap();
                let portable = from_macho(
                    arch,
                    entry.segment.as_bytes(),
                    entry.section.as_bytes(),
                    entry.macho_flags(),
                    0,
                );
                assert_eq!(portable.name, winner.portable);
                let back = to_macho(arch, &portable.name);
                assert_eq!(back.segment(), entry.segment.as_bytes());
                assert_eq!(back.section(), entry.section.as_bytes());
            }
        }
    }

    #[test]
    fn arch_table_has_priority() {
        let x86 = from_macho(Arch::X86_64, b"__TEXT", b"__symbol_stub", 0, 0);
        assert_eq!(x86.name, ".symbol_stub");
        assert_eq!(x86.kind, SectionKind::Text);

        let generic = from_macho(Arch::Generic, b"__TEXT", b"__symbol_stub", 0, 0);
        assert_eq!(generic.name, "__TEXT.__symbol_stub");

        let got = to_macho(Arch::Arm64, ".got");
        assert_eq!(got.segment(), b"__DATA");
        assert_eq!(got.section(), b"__got");
    }

    #[test]
    fn fallback_names() {
        let text = macho::VM_PROT_READ | macho::VM_PROT_EXECUTE;
        let section = from_macho(Arch::Generic, b"__TEXT", b"__foo", 0, text);
        assert_eq!(section.name, "__TEXT.__foo");
        assert_eq!(
            section.flags,
            SectionFlags::ALLOC | SectionFlags::LOAD | SectionFlags::CODE | SectionFlags::READONLY
        );
        assert!(section.entry.is_none());

        let section = from_macho(Arch::Generic, b"SEG", b"sect", macho::S_ZEROFILL, 7);
        assert_eq!(section.name, "LC_SEGMENT.SEG.sect");
        assert_eq!(section.flags, SectionFlags::ALLOC);
        assert_eq!(section.kind, SectionKind::UninitializedData);

        let section = from_macho(Arch::Generic, b"__X", b"__y", macho::S_ATTR_DEBUG, 7);
        assert_eq!(section.flags, SectionFlags::DEBUGGING);

        let back = to_macho(Arch::Generic, "LC_SEGMENT.SEG.sect");
        assert_eq!(back.segment(), b"SEG");
        assert_eq!(back.section(), b"sect");
        let back = to_macho(Arch::Generic, "__TEXT.__foo");
        assert_eq!(back.segment(), b"__TEXT");
        assert_eq!(back.section(), b"__foo");

        // No usable dot: the name is used for both fields.
        let back = to_macho(Arch::Generic, ".a_very_long_section_name");
        assert_eq!(back.segment(), b".a_very_long_sec");
        assert_eq!(back.section(), b".a_very_long_sec");
    }

    #[test]
    fn constant_names() {
        assert_eq!(cpu_type_name(macho::CPU_TYPE_ARM64), Some("arm64"));
        assert_eq!(file_type_name(macho::MH_OBJECT), Some("object"));
        assert_eq!(load_command_name(macho::LC_MAIN), Some("LC_MAIN"));
        assert_eq!(load_command_name(0x28), None);
        assert_eq!(value(LOAD_COMMANDS, "LC_SEGMENT_64"), Some(macho::LC_SEGMENT_64));
        assert_eq!(
            section_type_name(macho::S_SYMBOL_STUBS | macho::S_ATTR_PURE_INSTRUCTIONS),
            Some("S_SYMBOL_STUBS")
        );
    }

    #[test]
    fn guessed_macho_flags() {
        assert_eq!(guess_macho_flags(SectionFlags::ALLOC), macho::S_ZEROFILL);
        assert_eq!(
            guess_macho_flags(SectionFlags::DEBUGGING),
            macho::S_ATTR_DEBUG
        );
        assert_eq!(
            guess_macho_flags(SectionFlags::ALLOC | SectionFlags::LOAD | SectionFlags::DATA),
            macho::S_REGULAR
        );
    }
}
