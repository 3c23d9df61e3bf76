use core::fmt::Debug;

use crate::endian::{self, BigEndian, Endian, Endianness};
use crate::macho;
use crate::pod::Pod;
use crate::read::{Error, ReadError, ReadRef, Result};

use super::{Nlist, Section, Segment};

/// The decoded Mach-O header.
///
/// This is independent of the width and byte order of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// The magic as read in big-endian byte order.
    ///
    /// One of `MH_MAGIC`, `MH_CIGAM`, `MH_MAGIC_64` or `MH_CIGAM_64`.
    pub magic: u32,
    /// The `CPU_TYPE_*` value.
    pub cputype: u32,
    /// The `CPU_SUBTYPE_*` value.
    pub cpusubtype: u32,
    /// The `MH_*` file type.
    pub filetype: u32,
    /// The number of load commands.
    pub ncmds: u32,
    /// The size of the load command area.
    pub sizeofcmds: u32,
    /// The `MH_*` flags.
    pub flags: u32,
    /// The reserved word of a 64-bit header, or zero.
    pub reserved: u32,
    /// The byte order of the file.
    pub endian: Endianness,
    /// Whether the file uses the 64-bit layout.
    pub is_64: bool,
}

impl Header {
    /// The size of the header record.
    #[inline]
    pub fn size(&self) -> u64 {
        if self.is_64 {
            32
        } else {
            28
        }
    }

    /// The size in bytes of an address.
    #[inline]
    pub fn address_size(&self) -> u8 {
        if self.is_64 {
            8
        } else {
            4
        }
    }

    pub(super) fn from_raw<Mach: MachHeader<Endian = Endianness>>(
        raw: &Mach,
        endian: Endianness,
    ) -> Header {
        Header {
            magic: raw.magic(),
            cputype: raw.cputype(endian),
            cpusubtype: raw.cpusubtype(endian),
            filetype: raw.filetype(endian),
            ncmds: raw.ncmds(endian),
            sizeofcmds: raw.sizeofcmds(endian),
            flags: raw.flags(endian),
            reserved: raw.reserved(endian),
            endian,
            is_64: raw.is_type_64(),
        }
    }
}

/// A trait for generic access to [`macho::MachHeader32`] and [`macho::MachHeader64`].
#[allow(missing_docs)]
pub trait MachHeader: Debug + Pod {
    type Word: Into<u64>;
    type Endian: endian::Endian;
    type Segment: Segment<Endian = Self::Endian, Section = Self::Section>;
    type Section: Section<Endian = Self::Endian>;
    type Nlist: Nlist<Endian = Self::Endian>;

    /// Return true if this type is a 64-bit header.
    ///
    /// This is a property of the type, not a value in the header data.
    fn is_type_64(&self) -> bool;

    /// Return true if the `magic` field signifies big-endian.
    fn is_big_endian(&self) -> bool;

    /// Return true if the `magic` field signifies little-endian.
    fn is_little_endian(&self) -> bool;

    fn magic(&self) -> u32;
    fn cputype(&self, endian: Self::Endian) -> u32;
    fn cpusubtype(&self, endian: Self::Endian) -> u32;
    fn filetype(&self, endian: Self::Endian) -> u32;
    fn ncmds(&self, endian: Self::Endian) -> u32;
    fn sizeofcmds(&self, endian: Self::Endian) -> u32;
    fn flags(&self, endian: Self::Endian) -> u32;
    fn reserved(&self, endian: Self::Endian) -> u32;

    // Provided methods.

    /// Read the header at the given offset.
    ///
    /// Also checks that the magic field in the header is supported.
    fn parse<'data, R: ReadRef<'data>>(data: R, offset: u64) -> Result<&'data Self> {
        let header = data
            .read_at::<Self>(offset)
            .read_error("Invalid Mach-O header size or alignment")?;
        if !header.is_supported() {
            return Err(Error::format_mismatch());
        }
        Ok(header)
    }

    fn is_supported(&self) -> bool {
        self.is_little_endian() || self.is_big_endian()
    }

    fn endian(&self) -> Result<Self::Endian> {
        Self::Endian::from_big_endian(self.is_big_endian()).read_error("Unsupported Mach-O endian")
    }
}

impl<E: Endian> MachHeader for macho::MachHeader32<E> {
    type Word = u32;
    type Endian = E;
    type Segment = macho::SegmentCommand32<E>;
    type Section = macho::Section32<E>;
    type Nlist = macho::Nlist32<E>;

    fn is_type_64(&self) -> bool {
        false
    }

    fn is_big_endian(&self) -> bool {
        self.magic() == macho::MH_MAGIC
    }

    fn is_little_endian(&self) -> bool {
        self.magic() == macho::MH_CIGAM
    }

    fn magic(&self) -> u32 {
        self.magic.get(BigEndian)
    }

    fn cputype(&self, endian: Self::Endian) -> u32 {
        self.cputype.get(endian)
    }

    fn cpusubtype(&self, endian: Self::Endian) -> u32 {
        self.cpusubtype.get(endian)
    }

    fn filetype(&self, endian: Self::Endian) -> u32 {
        self.filetype.get(endian)
    }

    fn ncmds(&self, endian: Self::Endian) -> u32 {
        self.ncmds.get(endian)
    }

    fn sizeofcmds(&self, endian: Self::Endian) -> u32 {
        self.sizeofcmds.get(endian)
    }

    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }

    fn reserved(&self, _endian: Self::Endian) -> u32 {
        0
    }
}

impl<E: Endian> MachHeader for macho::MachHeader64<E> {
    type Word = u64;
    type Endian = E;
    type Segment = macho::SegmentCommand64<E>;
    type Section = macho::Section64<E>;
    type Nlist = macho::Nlist64<E>;

    fn is_type_64(&self) -> bool {
        true
    }

    fn is_big_endian(&self) -> bool {
        self.magic() == macho::MH_MAGIC_64
    }

    fn is_little_endian(&self) -> bool {
        self.magic() == macho::MH_CIGAM_64
    }

    fn magic(&self) -> u32 {
        self.magic.get(BigEndian)
    }

    fn cputype(&self, endian: Self::Endian) -> u32 {
        self.cputype.get(endian)
    }

    fn cpusubtype(&self, endian: Self::Endian) -> u32 {
        self.cpusubtype.get(endian)
    }

    fn filetype(&self, endian: Self::Endian) -> u32 {
        self.filetype.get(endian)
    }

    fn ncmds(&self, endian: Self::Endian) -> u32 {
        self.ncmds.get(endian)
    }

    fn sizeofcmds(&self, endian: Self::Endian) -> u32 {
        self.sizeofcmds.get(endian)
    }

    fn flags(&self, endian: Self::Endian) -> u32 {
        self.flags.get(endian)
    }

    fn reserved(&self, endian: Self::Endian) -> u32 {
        self.reserved.get(endian)
    }
}
