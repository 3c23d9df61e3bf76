use alloc::vec::Vec;

use crate::endian::Endianness;
use crate::macho;
use crate::read::{Error, ReadError, ReadRef, Result};
use crate::reloc::{Relocation, RelocationContext, RelocationInfo, SectionBounds};

use super::MachOSection;

/// The address ranges of `sections`, in Mach-O section number order.
pub(super) fn section_bounds(sections: &[MachOSection]) -> Vec<SectionBounds> {
    sections
        .iter()
        .map(|section| SectionBounds {
            address: section.addr,
            size: section.size,
        })
        .collect()
}

/// Read `count` raw relocation records at `reloff` from the image start.
pub(super) fn read_infos<'data, R: ReadRef<'data>>(
    data: R,
    offset: u64,
    reloff: u32,
    count: u32,
    endian: Endianness,
) -> Result<Vec<RelocationInfo>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let raw = data
        .read_slice_at::<macho::Relocation<Endianness>>(
            offset + u64::from(reloff),
            count as usize,
        )
        .read_error("Invalid Mach-O relocation offset or count")?;
    Ok(raw
        .iter()
        .map(|reloc| RelocationInfo::parse(reloc, endian))
        .collect())
}

/// Read and canonicalize the relocation records at `reloff`.
pub(super) fn decode_relocations<'data, R: ReadRef<'data>>(
    data: R,
    offset: u64,
    reloff: u32,
    count: u32,
    endian: Endianness,
    context: &RelocationContext<'_>,
) -> Result<Vec<Relocation>> {
    let infos = read_infos(data, offset, reloff, count, endian)?;
    context.decode_all(infos).map_err(Error)
}

/// An iterator over the raw relocation records of a section.
#[derive(Debug)]
pub struct RelocationInfoIterator<'data> {
    raw: core::slice::Iter<'data, macho::Relocation<Endianness>>,
    endian: Endianness,
}

impl<'data> RelocationInfoIterator<'data> {
    pub(super) fn new<R: ReadRef<'data>>(
        data: R,
        offset: u64,
        section: &MachOSection,
        endian: Endianness,
    ) -> Result<Self> {
        let raw = data
            .read_slice_at::<macho::Relocation<Endianness>>(
                offset + u64::from(section.reloff),
                section.nreloc as usize,
            )
            .read_error("Invalid Mach-O relocation offset or count")?;
        Ok(RelocationInfoIterator {
            raw: raw.iter(),
            endian,
        })
    }
}

impl<'data> Iterator for RelocationInfoIterator<'data> {
    type Item = RelocationInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw
            .next()
            .map(|reloc| RelocationInfo::parse(reloc, self.endian))
    }
}
