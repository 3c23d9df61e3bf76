use core::fmt::Debug;
use core::ops::Range;

use crate::endian::{self, Endian};
use crate::macho;
use crate::names;
use crate::pod::{self, Pod};
use crate::read::{ReadError, ReadRef, Result};

use super::Section;

/// A decoded `LC_SEGMENT` or `LC_SEGMENT_64` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachOSegment {
    /// The segment name, NUL padded.
    pub segname: [u8; 16],
    /// The address of the segment in memory.
    pub vmaddr: u64,
    /// The size of the segment in memory.
    pub vmsize: u64,
    /// The offset of the segment in the file.
    pub fileoff: u64,
    /// The size of the segment in the file.
    pub filesize: u64,
    /// The maximum `VM_PROT_*` protection.
    pub maxprot: u32,
    /// The initial `VM_PROT_*` protection.
    pub initprot: u32,
    /// The number of sections declared by the command.
    pub nsects: u32,
    /// The `SG_*` flags.
    pub flags: u32,
    /// The range of this segment's sections in the flattened section array.
    pub sections: Range<usize>,
}

impl MachOSegment {
    /// Return the segment name without padding.
    pub fn name(&self) -> &[u8] {
        names::trim_name(&self.segname)
    }

    /// Return the offset and size of the segment in the file.
    pub fn file_range(&self) -> (u64, u64) {
        (self.fileoff, self.filesize)
    }

    /// Return the segment data.
    ///
    /// `image_offset` is the offset of the image header within `data`.
    pub fn data<'data, R: ReadRef<'data>>(&self, data: R, image_offset: u64) -> Result<&'data [u8]> {
        data.read_bytes_at(image_offset + self.fileoff, self.filesize)
            .read_error("Invalid Mach-O segment size or offset")
    }

    pub(super) fn from_raw<S: Segment>(raw: &S, endian: S::Endian, first_section: usize) -> Self {
        let nsects = raw.nsects(endian);
        MachOSegment {
            segname: *raw.segname(),
            vmaddr: raw.vmaddr(endian).into(),
            vmsize: raw.vmsize(endian).into(),
            fileoff: raw.fileoff(endian).into(),
            filesize: raw.filesize(endian).into(),
            maxprot: raw.maxprot(endian),
            initprot: raw.initprot(endian),
            nsects,
            flags: raw.flags(endian),
            sections: first_section..first_section + nsects as usize,
        }
    }
}

/// A trait for generic access to [`macho::SegmentCommand32`] and [`macho::SegmentCommand64`].
#[allow(missing_docs)]
pub trait Segment: Debug + Pod {
    type Word: Into<u64>;
    type Endian: endian::Endian;
    type Section: Section<Endian = Self::Endian>;

    fn cmd(&self, endian: Self::Endian) -> u32;
    fn cmdsize(&self, endian: Self::Endian) -> u32;
    fn segname(&self) -> &[u8; 16];
    fn vmaddr(&self, endian: Self::Endian) -> Self::Word;
    fn vmsize(&self, endian: Self::Endian) -> Self::Word;
    fn fileoff(&self, endian: Self::Endian) -> Self::Word;
    fn filesize(&self, endian: Self::Endian) -> Self::Word;
    fn maxprot(&self, endian: Self::Endian) -> u32;
    fn initprot(&self, endian: Self::Endian) -> u32;
    fn nsects(&self, endian: Self::Endian) -> u32;
    fn flags(&self, endian: Self::Endian) -> u32;

    /// Return the `segname` bytes up until the null terminator.
    fn name(&self) -> &[u8] {
        names::trim_name(self.segname())
    }

    /// Parse the segment command at the start of `data`, and the array of
    /// sections that follows it.
    fn parse<'data>(
        endian: Self::Endian,
        data: &'data [u8],
    ) -> Result<(&'data Self, &'data [Self::Section])> {
        let (segment, tail) =
            pod::from_bytes::<Self>(data).read_error("Invalid Mach-O segment command size")?;
        let nsects = segment.nsects(endian) as usize;
        let (sections, _) = pod::slice_from_bytes(tail, nsects)
            .read_error("Mach-O segment sections extend past the command")?;
        Ok((segment, sections))
    }
}

impl<E: Endian> Segment for macho::SegmentCommand32<E> {
    type Word = u32;
    type Endian = E;
    type Section = macho::Section32<Self::Endian>;

    fn cmd(&self, endian: Self::Endian) -> u32 {
        self.cmd.get(endian)
    }
    fn cmdsize(&self, endian: Self::Endian) -> u32 {
        self.cmdsize.get(endian)
    }
    fn segname(&self) -> &[u8; 16] {
        &self.segname
    }
    fn vmaddr(&self, endian: Self::Endian) -> Self::Word {
        self.vmaddr.get(endian)
    }
    fn vmsize(&self, endian: Self::Endian) -> Self::Word {
        self.vmsize.get(endian)
    }
    fn fileoff(&self, endian: Self::Endian) -> Self::Word {
        self.fileoff.get(endian)
    }
    fn filesize(&self, endian: Self::Endian) -> Self::Word {
        self.filesize.get(endian)
    }
    fn maxprot(&self, endian: Self::Endian) -> u32 {
        self.maxprot.get(endian)
    }
    fn initprot(&self, endian: Self::Endian) -> u32 {
        self.initprot.get(endian)
    }
    fn nsects(&self, endian: Self::Endian) -> u32 {
        self.nsects.get(endian)
    }
    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }
}

impl<E: Endian> Segment for macho::SegmentCommand64<E> {
    type Word = u64;
    type Endian = E;
    type Section = macho::Section64<Self::Endian>;

    fn cmd(&self, endian: Self::Endian) -> u32 {
        self.cmd.get(endian)
    }
    fn cmdsize(&self, endian: Self::Endian) -> u32 {
        self.cmdsize.get(endian)
    }
    fn segname(&self) -> &[u8; 16] {
        &self.segname
    }
    fn vmaddr(&self, endian: Self::Endian) -> Self::Word {
        self.vmaddr.get(endian)
    }
    fn vmsize(&self, endian: Self::Endian) -> Self::Word {
        self.vmsize.get(endian)
    }
    fn fileoff(&self, endian: Self::Endian) -> Self::Word {
        self.fileoff.get(endian)
    }
    fn filesize(&self, endian: Self::Endian) -> Self::Word {
        self.filesize.get(endian)
    }
    fn maxprot(&self, endian: Self::Endian) -> u32 {
        self.maxprot.get(endian)
    }
    fn initprot(&self, endian: Self::Endian) -> u32 {
        self.initprot.get(endian)
    }
    fn nsects(&self, endian: Self::Endian) -> u32 {
        self.nsects.get(endian)
    }
    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }
}
