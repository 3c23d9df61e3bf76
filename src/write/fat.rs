use alloc::vec::Vec;
use core::convert::{TryFrom, TryInto};
use core::mem;

use crate::endian::{BigEndian, Endian, Endianness, U32};
use crate::macho;
use crate::write::util::{align, WritableBuffer};
use crate::write::{Error, Result};

/// The default alignment of fat archive members, as a power of 2.
pub const FAT_DEFAULT_ALIGN: u32 = 14;

/// A builder for fat archives.
///
/// Each member is placed at an offset that is a multiple of `1 << align`.
/// The cpu type and subtype of the member table entries are read from the
/// image headers.
#[derive(Debug)]
pub struct FatBuilder<'a> {
    /// The member alignment as a power of 2.
    pub align: u32,
    images: Vec<&'a [u8]>,
}

impl<'a> Default for FatBuilder<'a> {
    fn default() -> Self {
        FatBuilder::new()
    }
}

impl<'a> FatBuilder<'a> {
    /// Create a builder with the default alignment.
    pub fn new() -> Self {
        FatBuilder {
            align: FAT_DEFAULT_ALIGN,
            images: Vec::new(),
        }
    }

    /// Add a single-architecture image.
    pub fn add(&mut self, image: &'a [u8]) -> &mut Self {
        self.images.push(image);
        self
    }

    /// The number of images added so far.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Return true if no images have been added.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Write the archive to a `Vec`.
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.emit(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the archive to a `WritableBuffer`.
    pub fn emit(&self, buffer: &mut dyn WritableBuffer) -> Result<()> {
        if self.images.len() > macho::FAT_MAX_ARCH as usize {
            return Err(Error::new("Too many fat archive members"));
        }
        if self.align >= 32 {
            return Err(Error::new("Fat archive alignment is too large"));
        }
        let alignment = 1usize << self.align;

        let mut arches = Vec::with_capacity(self.images.len());
        let mut offset = mem::size_of::<macho::FatHeader>()
            + self.images.len() * mem::size_of::<macho::FatArch32>();
        for image in &self.images {
            let (cputype, cpusubtype) = image_cpu(image)?;
            offset = align(offset, alignment);
            let member_offset = u32::try_from(offset)
                .map_err(|_| Error::new("Fat archive member offset exceeds 32 bits"))?;
            let size = u32::try_from(image.len())
                .map_err(|_| Error::new("Fat archive member size exceeds 32 bits"))?;
            arches.push(macho::FatArch32 {
                cputype: U32::new(BigEndian, cputype),
                cpusubtype: U32::new(BigEndian, cpusubtype),
                offset: U32::new(BigEndian, member_offset),
                size: U32::new(BigEndian, size),
                align: U32::new(BigEndian, self.align),
            });
            offset += image.len();
        }

        buffer
            .reserve(offset)
            .map_err(|_| Error::new("Cannot allocate buffer"))?;
        buffer.write(&macho::FatHeader {
            magic: U32::new(BigEndian, macho::FAT_MAGIC),
            nfat_arch: U32::new(BigEndian, arches.len() as u32),
        });
        buffer.write_slice(&arches);
        for (arch, image) in arches.iter().zip(&self.images) {
            buffer.resize(arch.offset.get(BigEndian) as usize);
            buffer.write_bytes(image);
        }
        debug_assert_eq!(offset, buffer.len());
        Ok(())
    }
}

/// Read the cpu type and subtype from a Mach-O header.
fn image_cpu(image: &[u8]) -> Result<(u32, u32)> {
    let word = |offset: usize| -> Option<[u8; 4]> {
        image.get(offset..offset + 4)?.try_into().ok()
    };
    let magic = word(0).ok_or_else(|| Error::new("Fat archive member is too small"))?;
    let endian = match u32::from_be_bytes(magic) {
        macho::MH_MAGIC | macho::MH_MAGIC_64 => Endianness::Big,
        macho::MH_CIGAM | macho::MH_CIGAM_64 => Endianness::Little,
        _ => return Err(Error::new("Fat archive member is not a Mach-O image")),
    };
    let read = |offset: usize| -> Result<u32> {
        word(offset)
            .map(|bytes| endian.read_u32_bytes(bytes))
            .ok_or_else(|| Error::new("Fat archive member is too small"))
    };
    Ok((read(4)?, read(8)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(magic: u32, cputype: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&magic.to_be_bytes());
        data.extend_from_slice(&cputype.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.resize(28, 0);
        data
    }

    #[test]
    fn member_layout() {
        let a = image(macho::MH_CIGAM_64, macho::CPU_TYPE_X86_64);
        let b = image(macho::MH_CIGAM, macho::CPU_TYPE_X86);
        let mut builder = FatBuilder::new();
        builder.align = 4;
        builder.add(&a).add(&b);
        let data = builder.write().unwrap();
        assert_eq!(&data[..4], &macho::FAT_MAGIC.to_be_bytes());
        assert_eq!(&data[4..8], &2u32.to_be_bytes());
        // First member after the 48-byte table.
        assert_eq!(&data[8..12], &macho::CPU_TYPE_X86_64.to_be_bytes());
        assert_eq!(&data[16..20], &48u32.to_be_bytes());
        assert_eq!(&data[48..76], &a[..]);
        assert_eq!(&data[36..40], &80u32.to_be_bytes());
        assert_eq!(&data[80..], &b[..]);
    }

    #[test]
    fn bad_members() {
        let mut builder = FatBuilder::new();
        builder.add(&[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(builder.write().is_err());

        let a = image(macho::MH_CIGAM, macho::CPU_TYPE_X86);
        let mut builder = FatBuilder::new();
        for _ in 0..31 {
            builder.add(&a);
        }
        assert!(builder.write().is_err());
    }
}
