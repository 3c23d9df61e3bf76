use core::fmt;
use core::ops;

use crate::macho;

/// The architecture of a Mach-O image.
///
/// This selects the relocation backend and the architecture specific
/// section name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Arch {
    /// 32-bit ARM and Thumb.
    Arm,
    /// AArch64.
    Arm64,
    /// 32-bit x86.
    I386,
    /// x86-64.
    #[allow(non_camel_case_types)]
    X86_64,
    /// Any other cpu type.
    ///
    /// Relocations are decoded with the generic rules.
    Generic,
}

impl Arch {
    /// Select the architecture for a Mach-O cpu type.
    pub fn from_cputype(cputype: u32) -> Arch {
        match cputype {
            macho::CPU_TYPE_ARM => Arch::Arm,
            macho::CPU_TYPE_ARM64 => Arch::Arm64,
            macho::CPU_TYPE_X86 => Arch::I386,
            macho::CPU_TYPE_X86_64 => Arch::X86_64,
            _ => Arch::Generic,
        }
    }

    /// The size in bytes of a pointer, or `None` for `Generic`.
    pub fn address_size(self) -> Option<u8> {
        match self {
            Arch::Arm | Arch::I386 => Some(4),
            Arch::Arm64 | Arch::X86_64 => Some(8),
            Arch::Generic => None,
        }
    }
}

/// The kind of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SectionKind {
    /// The section kind is unknown.
    Unknown,
    /// An executable code section.
    ///
    /// Example Mach-O sections: `__TEXT,__text`
    Text,
    /// A data section.
    ///
    /// Example Mach-O sections: `__DATA,__data`
    Data,
    /// A read only data section.
    ///
    /// Example Mach-O sections: `__TEXT,__const`
    ReadOnlyData,
    /// A loadable string section.
    ///
    /// Example Mach-O sections: `__TEXT,__cstring`
    ReadOnlyString,
    /// An uninitialized data section.
    ///
    /// Example Mach-O sections: `__DATA,__bss`
    UninitializedData,
    /// A TLS data section.
    ///
    /// Example Mach-O sections: `__DATA,__thread_data`
    Tls,
    /// An uninitialized TLS data section.
    ///
    /// Example Mach-O sections: `__DATA,__thread_bss`
    UninitializedTls,
    /// A TLS variables section.
    ///
    /// This contains TLS descriptors.
    ///
    /// Example Mach-O sections: `__DATA,__thread_vars`
    TlsVariables,
    /// Pointers or stubs that are described by the indirect symbol table.
    ///
    /// Example Mach-O sections: `__DATA,__la_symbol_ptr`, `__TEXT,__stubs`
    Indirect,
    /// A debugging section.
    ///
    /// Example Mach-O sections: `__DWARF,__debug_info`
    Debug,
    /// Some other section.
    Other,
}

impl SectionKind {
    /// Return true if this section contains zerofill data.
    pub fn is_bss(self) -> bool {
        self == SectionKind::UninitializedData || self == SectionKind::UninitializedTls
    }

    /// Derive the kind from the Mach-O section flags and the portable flags.
    pub fn from_flags(macho_flags: u32, flags: SectionFlags) -> SectionKind {
        match macho_flags & macho::SECTION_TYPE {
            macho::S_ZEROFILL | macho::S_GB_ZEROFILL => return SectionKind::UninitializedData,
            macho::S_THREAD_LOCAL_ZEROFILL => return SectionKind::UninitializedTls,
            macho::S_THREAD_LOCAL_REGULAR => return SectionKind::Tls,
            macho::S_THREAD_LOCAL_VARIABLES => return SectionKind::TlsVariables,
            macho::S_CSTRING_LITERALS => return SectionKind::ReadOnlyString,
            macho::S_NON_LAZY_SYMBOL_POINTERS
            | macho::S_LAZY_SYMBOL_POINTERS
            | macho::S_LAZY_DYLIB_SYMBOL_POINTERS
            | macho::S_SYMBOL_STUBS => return SectionKind::Indirect,
            _ => {}
        }
        if flags.contains(SectionFlags::DEBUGGING) {
            SectionKind::Debug
        } else if flags.contains(SectionFlags::CODE) {
            SectionKind::Text
        } else if flags.contains(SectionFlags::READONLY) {
            SectionKind::ReadOnlyData
        } else if flags.contains(SectionFlags::DATA) {
            SectionKind::Data
        } else if flags.is_empty() {
            SectionKind::Unknown
        } else {
            SectionKind::Other
        }
    }
}

/// Portable section flags.
///
/// These describe how a section is used independently of its Mach-O
/// section type and attribute bits.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionFlags(u32);

impl SectionFlags {
    /// No flags.
    pub const NONE: SectionFlags = SectionFlags(0);
    /// The section occupies memory at run time.
    pub const ALLOC: SectionFlags = SectionFlags(1 << 0);
    /// The section contents are loaded from the file.
    pub const LOAD: SectionFlags = SectionFlags(1 << 1);
    /// The section contains executable code.
    pub const CODE: SectionFlags = SectionFlags(1 << 2);
    /// The section contains data.
    pub const DATA: SectionFlags = SectionFlags(1 << 3);
    /// The section is read only.
    pub const READONLY: SectionFlags = SectionFlags(1 << 4);
    /// The section contains debugging information.
    pub const DEBUGGING: SectionFlags = SectionFlags(1 << 5);
    /// The section contents may be merged with identical entries.
    pub const MERGE: SectionFlags = SectionFlags(1 << 6);
    /// The section contains NUL terminated strings.
    pub const STRINGS: SectionFlags = SectionFlags(1 << 7);

    /// Return the raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Construct flags from raw bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        SectionFlags(bits)
    }

    /// Return true if no flags are set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Return true if all of the flags in `other` are set.
    #[inline]
    pub fn contains(self, other: SectionFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ops::BitOr for SectionFlags {
    type Output = SectionFlags;

    #[inline]
    fn bitor(self, rhs: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for SectionFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: SectionFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(SectionFlags, &str)] = &[
            (SectionFlags::ALLOC, "ALLOC"),
            (SectionFlags::LOAD, "LOAD"),
            (SectionFlags::CODE, "CODE"),
            (SectionFlags::DATA, "DATA"),
            (SectionFlags::READONLY, "READONLY"),
            (SectionFlags::DEBUGGING, "DEBUGGING"),
            (SectionFlags::MERGE, "MERGE"),
            (SectionFlags::STRINGS, "STRINGS"),
        ];
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(*flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_selection() {
        assert_eq!(Arch::from_cputype(macho::CPU_TYPE_X86_64), Arch::X86_64);
        assert_eq!(Arch::from_cputype(macho::CPU_TYPE_ARM64), Arch::Arm64);
        assert_eq!(Arch::from_cputype(macho::CPU_TYPE_POWERPC), Arch::Generic);
        assert_eq!(Arch::I386.address_size(), Some(4));
    }

    #[test]
    fn section_flags() {
        let flags = SectionFlags::ALLOC | SectionFlags::LOAD | SectionFlags::CODE;
        assert!(flags.contains(SectionFlags::CODE));
        assert!(!flags.contains(SectionFlags::DATA | SectionFlags::CODE));
        assert_eq!(alloc::format!("{:?}", flags), "ALLOC | LOAD | CODE");
        assert_eq!(alloc::format!("{:?}", SectionFlags::NONE), "NONE");
    }

    #[test]
    fn section_kind() {
        assert_eq!(
            SectionKind::from_flags(macho::S_ZEROFILL, SectionFlags::ALLOC),
            SectionKind::UninitializedData
        );
        assert_eq!(
            SectionKind::from_flags(
                macho::S_REGULAR | macho::S_ATTR_PURE_INSTRUCTIONS,
                SectionFlags::CODE | SectionFlags::LOAD
            ),
            SectionKind::Text
        );
        assert_eq!(
            SectionKind::from_flags(macho::S_LAZY_SYMBOL_POINTERS, SectionFlags::DATA),
            SectionKind::Indirect
        );
    }
}
