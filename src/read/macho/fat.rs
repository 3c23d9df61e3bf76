use crate::common::Arch;
use crate::endian::BigEndian;
use crate::macho;
use crate::read::{Error, FileKind, ReadError, ReadRef, Result};

use super::MachOFile;

pub use macho::{FatArch32, FatHeader};

/// A Mach-O universal binary.
///
/// This is a file that starts with [`macho::FatHeader`], and corresponds
/// to [`FileKind::MachOFat32`].
#[derive(Debug, Clone, Copy)]
pub struct MachOFatFile<'data, R = &'data [u8]>
where
    R: ReadRef<'data>,
{
    data: R,
    header: &'data macho::FatHeader,
    arches: &'data [FatArch32],
}

impl<'data, R: ReadRef<'data>> MachOFatFile<'data, R> {
    /// Parse the fat header and the member table.
    ///
    /// Every member must lie within the file.
    pub fn parse(data: R) -> Result<Self> {
        let mut offset = 0;
        let header = data
            .read::<FatHeader>(&mut offset)
            .read_error("Invalid fat header size or alignment")?;
        if header.magic.get(BigEndian) != macho::FAT_MAGIC {
            return Err(Error::format_mismatch());
        }
        let nfat_arch = header.nfat_arch.get(BigEndian);
        if nfat_arch > macho::FAT_MAX_ARCH {
            return Err(Error("Too many fat archive members"));
        }
        let arches = data
            .read_slice::<FatArch32>(&mut offset, nfat_arch as usize)
            .read_error("Invalid nfat_arch")?;
        let len = data.len().read_error("Unknown fat archive size")?;
        for arch in arches {
            let (start, size) = arch.file_range();
            if start.checked_add(size).map_or(true, |end| end > len) {
                return Err(Error("Fat archive member extends past the end of the file"));
            }
        }
        Ok(MachOFatFile {
            data,
            header,
            arches,
        })
    }

    /// Return the fat header.
    pub fn header(&self) -> &'data macho::FatHeader {
        self.header
    }

    /// Return the member table.
    pub fn arches(&self) -> &'data [FatArch32] {
        self.arches
    }

    /// Iterate over the members in table order.
    pub fn members(&self) -> FatMemberIterator<'data, R> {
        FatMemberIterator {
            data: self.data,
            arches: self.arches.iter(),
        }
    }

    /// Return the data of a member.
    pub fn arch_data(&self, arch: &FatArch32) -> Result<&'data [u8]> {
        arch.data(self.data)
    }

    /// Return the first member with the given cpu type and subtype.
    ///
    /// The capability bits of the subtype are ignored.
    pub fn find(&self, cputype: u32, cpusubtype: u32) -> Option<&'data FatArch32> {
        self.arches
            .iter()
            .find(|arch| arch.matches(cputype, cpusubtype))
    }

    /// Parse the first member with the given cpu type and subtype that is a
    /// valid Mach-O image.
    pub fn extract(&self, cputype: u32, cpusubtype: u32) -> Result<MachOFile<'data>> {
        let mut error = Error("No fat archive member for the cpu type");
        for arch in self.arches.iter().filter(|arch| arch.matches(cputype, cpusubtype)) {
            let data = arch.data(self.data)?;
            match MachOFile::parse(data) {
                Ok(file) => return Ok(file),
                Err(e) => error = e,
            }
        }
        Err(error)
    }
}

/// Parse the image for the given cpu type from either a fat archive or a
/// single-architecture file.
///
/// A single-architecture file is returned if its cpu type and subtype match.
pub fn extract_image<'data>(
    data: &'data [u8],
    cputype: u32,
    cpusubtype: u32,
) -> Result<MachOFile<'data>> {
    match FileKind::parse(data)? {
        FileKind::MachOFat32 => MachOFatFile::parse(data)?.extract(cputype, cpusubtype),
        _ => {
            let file = MachOFile::parse(data)?;
            let header = file.header();
            if header.cputype == cputype && subtype_matches(header.cpusubtype, cpusubtype) {
                Ok(file)
            } else {
                Err(Error("Mach-O file does not match the cpu type"))
            }
        }
    }
}

fn subtype_matches(a: u32, b: u32) -> bool {
    a & !macho::CPU_SUBTYPE_MASK == b & !macho::CPU_SUBTYPE_MASK
}

/// A fat archive member and its data.
#[derive(Debug, Clone, Copy)]
pub struct FatMember<'data> {
    /// The member table entry.
    pub arch: &'data FatArch32,
    /// The member data.
    pub data: &'data [u8],
}

/// An iterator over the members of a fat archive.
#[derive(Debug)]
pub struct FatMemberIterator<'data, R = &'data [u8]>
where
    R: ReadRef<'data>,
{
    data: R,
    arches: core::slice::Iter<'data, FatArch32>,
}

impl<'data, R: ReadRef<'data>> Iterator for FatMemberIterator<'data, R> {
    type Item = Result<FatMember<'data>>;

    fn next(&mut self) -> Option<Self::Item> {
        let arch = self.arches.next()?;
        Some(arch.data(self.data).map(|data| FatMember { arch, data }))
    }
}

impl FatArch32 {
    /// The `CPU_TYPE_*` value.
    pub fn cputype(&self) -> u32 {
        self.cputype.get(BigEndian)
    }

    /// The `CPU_SUBTYPE_*` value.
    pub fn cpusubtype(&self) -> u32 {
        self.cpusubtype.get(BigEndian)
    }

    /// The offset of the member in the file.
    pub fn offset(&self) -> u32 {
        self.offset.get(BigEndian)
    }

    /// The size of the member.
    pub fn size(&self) -> u32 {
        self.size.get(BigEndian)
    }

    /// The log2 of the member alignment.
    pub fn align(&self) -> u32 {
        self.align.get(BigEndian)
    }

    /// The relocation architecture of the member.
    pub fn architecture(&self) -> Arch {
        Arch::from_cputype(self.cputype())
    }

    /// Return the offset and size of the member.
    pub fn file_range(&self) -> (u64, u64) {
        (self.offset().into(), self.size().into())
    }

    /// Return the member data.
    pub fn data<'data, R: ReadRef<'data>>(&self, file: R) -> Result<&'data [u8]> {
        file.read_bytes_at(self.offset().into(), self.size().into())
            .read_error("Invalid fat arch offset or size")
    }

    fn matches(&self, cputype: u32, cpusubtype: u32) -> bool {
        self.cputype() == cputype && subtype_matches(self.cpusubtype(), cpusubtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fat(entries: &[(u32, u32, u32, u32)], len: usize) -> alloc::vec::Vec<u8> {
        let mut data = alloc::vec::Vec::new();
        data.extend_from_slice(&macho::FAT_MAGIC.to_be_bytes());
        data.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for &(cputype, cpusubtype, offset, size) in entries {
            for word in [cputype, cpusubtype, offset, size, 12] {
                data.extend_from_slice(&word.to_be_bytes());
            }
        }
        data.resize(len, 0);
        data
    }

    #[test]
    fn member_bounds() {
        let data = fat(&[(macho::CPU_TYPE_X86_64, 3, 64, 16)], 80);
        let file = MachOFatFile::parse(&data[..]).unwrap();
        assert_eq!(file.arches().len(), 1);
        let arch = file.find(macho::CPU_TYPE_X86_64, 3 | 0x8000_0000).unwrap();
        assert_eq!(arch.file_range(), (64, 16));
        assert_eq!(arch.architecture(), Arch::X86_64);
        assert!(file.find(macho::CPU_TYPE_ARM64, 0).is_none());
        let members: alloc::vec::Vec<_> = file.members().collect::<Result<_>>().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].data.len(), 16);

        let data = fat(&[(macho::CPU_TYPE_X86_64, 3, 64, 17)], 80);
        assert!(MachOFatFile::parse(&data[..]).is_err());
    }

    #[test]
    fn member_count() {
        let entries = [(macho::CPU_TYPE_X86, 3, 0, 0); 31];
        let data = fat(&entries, 8 + 31 * 20);
        assert!(MachOFatFile::parse(&data[..]).is_err());
        let data = fat(&entries[..30], 8 + 30 * 20);
        assert!(MachOFatFile::parse(&data[..]).is_ok());
    }

    #[test]
    fn extract_mismatch() {
        let data = fat(&[(macho::CPU_TYPE_X86_64, 3, 64, 16)], 80);
        let file = MachOFatFile::parse(&data[..]).unwrap();
        // The member is not a Mach-O image.
        assert!(file.extract(macho::CPU_TYPE_X86_64, 3).is_err());
        assert!(file.extract(macho::CPU_TYPE_ARM, 0).is_err());
    }
}
