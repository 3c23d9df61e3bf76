use alloc::borrow::Cow;
use core::fmt::Debug;
use core::str;

use crate::common::{Arch, SectionFlags, SectionKind};
use crate::endian::{self, Endian};
use crate::macho;
use crate::names::{self, PortableSection};
use crate::pod::Pod;
use crate::read::{ReadError, ReadRef, Result, SectionIndex};

/// A decoded section record, together with its portable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachOSection {
    /// The Mach-O section number.
    pub index: SectionIndex,
    /// The section name, NUL padded.
    pub sectname: [u8; 16],
    /// The segment name, NUL padded.
    pub segname: [u8; 16],
    /// The address of the section in memory.
    pub addr: u64,
    /// The size of the section in memory.
    pub size: u64,
    /// The offset of the section data in the file.
    pub offset: u32,
    /// The log2 of the alignment.
    pub align: u32,
    /// The offset of the relocation records in the file.
    pub reloff: u32,
    /// The number of relocation records.
    pub nreloc: u32,
    /// The section type and attribute bits.
    pub flags: u32,
    /// The first indirect symbol index for pointer and stub sections.
    pub reserved1: u32,
    /// The stub size for stub sections.
    pub reserved2: u32,
    /// Only present in 64-bit files.
    pub reserved3: u32,
    /// The initial protection of the containing segment.
    pub initprot: u32,
    portable: PortableSection,
}

impl MachOSection {
    pub(super) fn from_raw<S: Section>(
        raw: &S,
        endian: S::Endian,
        arch: Arch,
        index: SectionIndex,
        initprot: u32,
    ) -> Self {
        let flags = raw.flags(endian);
        let portable = names::from_macho(arch, raw.segment_name(), raw.name(), flags, initprot);
        MachOSection {
            index,
            sectname: *raw.sectname(),
            segname: *raw.segname(),
            addr: raw.addr(endian).into(),
            size: raw.size(endian).into(),
            offset: raw.offset(endian),
            align: raw.align(endian),
            reloff: raw.reloff(endian),
            nreloc: raw.nreloc(endian),
            flags,
            reserved1: raw.reserved1(endian),
            reserved2: raw.reserved2(endian),
            reserved3: raw.reserved3(endian),
            initprot,
            portable,
        }
    }

    /// Return the `sectname` bytes up until the null terminator.
    pub fn name(&self) -> &[u8] {
        names::trim_name(&self.sectname)
    }

    /// Return the `segname` bytes up until the null terminator.
    pub fn segment_name(&self) -> &[u8] {
        names::trim_name(&self.segname)
    }

    /// The portable name of the section, such as `.text` or `__TEXT.__foo`.
    pub fn portable_name(&self) -> &str {
        &self.portable.name
    }

    /// The portable name of the section, as an owned or static string.
    pub fn portable_name_cow(&self) -> Cow<'static, str> {
        self.portable.name.clone()
    }

    /// The name table entry for this section, if it is a well-known section.
    pub fn table_entry(&self) -> Option<&'static names::SectionName> {
        self.portable.entry
    }

    /// The portable section kind.
    pub fn kind(&self) -> SectionKind {
        self.portable.kind
    }

    /// The portable section flags.
    pub fn portable_flags(&self) -> SectionFlags {
        self.portable.flags
    }

    /// The `S_*` section type.
    #[inline]
    pub fn section_type(&self) -> u32 {
        self.flags & macho::SECTION_TYPE
    }

    /// The `S_ATTR_*` section attributes.
    #[inline]
    pub fn attributes(&self) -> u32 {
        self.flags & macho::SECTION_ATTRIBUTES
    }

    /// Return true for sections that occupy no space in the file.
    pub fn is_zerofill(&self) -> bool {
        matches!(
            self.section_type(),
            macho::S_ZEROFILL | macho::S_GB_ZEROFILL | macho::S_THREAD_LOCAL_ZEROFILL
        )
    }

    /// Return the offset and size of the section in the file.
    ///
    /// Returns `None` for sections that have no data in the file.
    pub fn file_range(&self) -> Option<(u64, u64)> {
        if self.is_zerofill() {
            None
        } else {
            Some((self.offset.into(), self.size))
        }
    }

    /// Return the section data.
    ///
    /// `image_offset` is the offset of the image header within `data`.
    /// Returns `Ok(&[])` if the section has no data in the file.
    pub fn data<'data, R: ReadRef<'data>>(&self, data: R, image_offset: u64) -> Result<&'data [u8]> {
        if let Some((offset, size)) = self.file_range() {
            data.read_bytes_at(image_offset + offset, size)
                .read_error("Invalid Mach-O section size or offset")
        } else {
            Ok(&[])
        }
    }

    /// Return true if the indirect symbol table describes the entries of
    /// this section.
    pub fn is_indirect(&self) -> bool {
        matches!(
            self.section_type(),
            macho::S_NON_LAZY_SYMBOL_POINTERS
                | macho::S_LAZY_SYMBOL_POINTERS
                | macho::S_LAZY_DYLIB_SYMBOL_POINTERS
                | macho::S_SYMBOL_STUBS
        )
    }

    /// The size of one entry of a pointer or stub section.
    ///
    /// This is the pointer width for pointer sections, `reserved2` for stub
    /// sections, and zero for other sections.
    pub fn entry_size(&self, is_64: bool) -> u64 {
        match self.section_type() {
            macho::S_NON_LAZY_SYMBOL_POINTERS
            | macho::S_LAZY_SYMBOL_POINTERS
            | macho::S_LAZY_DYLIB_SYMBOL_POINTERS => {
                if is_64 {
                    8
                } else {
                    4
                }
            }
            macho::S_SYMBOL_STUBS => self.reserved2.into(),
            _ => 0,
        }
    }

    /// The number of entries of a pointer or stub section.
    ///
    /// Returns zero if the entry size is zero.
    pub fn indirect_count(&self, is_64: bool) -> u64 {
        match self.entry_size(is_64) {
            0 => 0,
            entry_size => self.size / entry_size,
        }
    }

    /// Return the name as `segname,sectname`, for use in diagnostics.
    pub fn display_name(&self) -> Cow<'_, str> {
        match (str::from_utf8(self.segment_name()), str::from_utf8(self.name())) {
            (Ok(segment), Ok(section)) => Cow::Owned(alloc::format!("{},{}", segment, section)),
            _ => Cow::Borrowed(self.portable_name()),
        }
    }
}

/// A trait for generic access to [`macho::Section32`] and [`macho::Section64`].
#[allow(missing_docs)]
pub trait Section: Debug + Pod {
    type Word: Into<u64>;
    type Endian: endian::Endian;

    fn sectname(&self) -> &[u8; 16];
    fn segname(&self) -> &[u8; 16];
    fn addr(&self, endian: Self::Endian) -> Self::Word;
    fn size(&self, endian: Self::Endian) -> Self::Word;
    fn offset(&self, endian: Self::Endian) -> u32;
    fn align(&self, endian: Self::Endian) -> u32;
    fn reloff(&self, endian: Self::Endian) -> u32;
    fn nreloc(&self, endian: Self::Endian) -> u32;
    fn flags(&self, endian: Self::Endian) -> u32;
    fn reserved1(&self, endian: Self::Endian) -> u32;
    fn reserved2(&self, endian: Self::Endian) -> u32;
    fn reserved3(&self, endian: Self::Endian) -> u32;

    /// Return the `sectname` bytes up until the null terminator.
    fn name(&self) -> &[u8] {
        names::trim_name(self.sectname())
    }

    /// Return the `segname` bytes up until the null terminator.
    fn segment_name(&self) -> &[u8] {
        names::trim_name(self.segname())
    }
}

impl<E: Endian> Section for macho::Section32<E> {
    type Word = u32;
    type Endian = E;

    fn sectname(&self) -> &[u8; 16] {
        &self.sectname
    }
    fn segname(&self) -> &[u8; 16] {
        &self.segname
    }
    fn addr(&self, endian: Self::Endian) -> Self::Word {
        self.addr.get(endian)
    }
    fn size(&self, endian: Self::Endian) -> Self::Word {
        self.size.get(endian)
    }
    fn offset(&self, endian: Self::Endian) -> u32 {
        self.offset.get(endian)
    }
    fn align(&self, endian: Self::Endian) -> u32 {
        self.align.get(endian)
    }
    fn reloff(&self, endian: Self::Endian) -> u32 {
        self.reloff.get(endian)
    }
    fn nreloc(&self, endian: Self::Endian) -> u32 {
        self.nreloc.get(endian)
    }
    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }
    fn reserved1(&self, endian: Self::Endian) -> u32 {
        self.reserved1.get(endian)
    }
    fn reserved2(&self, endian: Self::Endian) -> u32 {
        self.reserved2.get(endian)
    }
    fn reserved3(&self, _endian: Self::Endian) -> u32 {
        0
    }
}

impl<E: Endian> Section for macho::Section64<E> {
    type Word = u64;
    type Endian = E;

    fn sectname(&self) -> &[u8; 16] {
        &self.sectname
    }
    fn segname(&self) -> &[u8; 16] {
        &self.segname
    }
    fn addr(&self, endian: Self::Endian) -> Self::Word {
        self.addr.get(endian)
    }
    fn size(&self, endian: Self::Endian) -> Self::Word {
        self.size.get(endian)
    }
    fn offset(&self, endian: Self::Endian) -> u32 {
        self.offset.get(endian)
    }
    fn align(&self, endian: Self::Endian) -> u32 {
        self.align.get(endian)
    }
    fn reloff(&self, endian: Self::Endian) -> u32 {
        self.reloff.get(endian)
    }
    fn nreloc(&self, endian: Self::Endian) -> u32 {
        self.nreloc.get(endian)
    }
    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }
    fn reserved1(&self, endian: Self::Endian) -> u32 {
        self.reserved1.get(endian)
    }
    fn reserved2(&self, endian: Self::Endian) -> u32 {
        self.reserved2.get(endian)
    }
    fn reserved3(&self, endian: Self::Endian) -> u32 {
        self.reserved3.get(endian)
    }
}
