use alloc::vec::Vec;
use core::convert::TryFrom;

use crate::endian::{Endianness, U32};
use crate::macho;
use crate::read::{Error, ReadError, ReadRef, Result, SectionIndex, SymbolIndex};
use crate::reloc::DylibReferenceInfo;

use super::{Dysymtab, MachOSection, MachOSymbol};

/// An entry of the module table, independent of the file width.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DylibModule {
    /// The module name, as an offset in the string table.
    pub module_name: u32,
    /// The first externally defined symbol of the module.
    pub iextdefsym: u32,
    /// The number of externally defined symbols.
    pub nextdefsym: u32,
    /// The first entry of the module in the external reference table.
    pub irefsym: u32,
    /// The number of external reference table entries.
    pub nrefsym: u32,
    /// The first local symbol of the module.
    pub ilocalsym: u32,
    /// The number of local symbols.
    pub nlocalsym: u32,
    /// The first external relocation of the module.
    pub iextrel: u32,
    /// The number of external relocations.
    pub nextrel: u32,
    /// Low 16 bits: init section index. High 16 bits: term section index.
    pub iinit_iterm: u32,
    /// Low 16 bits: init section count. High 16 bits: term section count.
    pub ninit_nterm: u32,
    /// The address of the module's `(__OBJC,__module_info)` section.
    pub objc_module_info_addr: u64,
    /// The size of the module's `(__OBJC,__module_info)` section.
    pub objc_module_info_size: u32,
}

/// An entry of the table of contents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TocEntry {
    /// The defined external symbol.
    pub symbol_index: u32,
    /// The module that defines the symbol.
    pub module_index: u32,
}

/// A symbol synthesized for one slot of a pointer or stub section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubSymbol {
    /// The symbol name with a `$stub` suffix.
    pub name: Vec<u8>,
    /// The section that holds the slot.
    pub section: SectionIndex,
    /// The offset of the slot in the section.
    pub value: u64,
    /// The address of the slot.
    pub address: u64,
    /// The symbol that the slot refers to.
    pub symbol: SymbolIndex,
}

/// The decoded dynamic symbol table and its side tables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DysymtabTables {
    /// The fields of the `LC_DYSYMTAB` command.
    pub fields: Dysymtab,
    /// The module table.
    pub modules: Vec<DylibModule>,
    /// The table of contents.
    pub toc: Vec<TocEntry>,
    /// The external reference table.
    pub external_refs: Vec<DylibReferenceInfo>,
    /// The indirect symbol table.
    pub indirect_symbols: Vec<u32>,
}

impl DysymtabTables {
    /// Read the side tables described by `fields`.
    ///
    /// `offset` is the offset of the image within `data`.
    pub(super) fn parse<'data, R: ReadRef<'data>>(
        data: R,
        offset: u64,
        fields: &Dysymtab,
        nsyms: u32,
        endian: Endianness,
        is_64: bool,
    ) -> Result<Self> {
        check_partition(fields, nsyms)?;

        let mut tables = DysymtabTables {
            fields: *fields,
            ..Default::default()
        };

        if fields.nmodtab != 0 {
            let modoff = offset + u64::from(fields.modtaboff);
            let count = fields.nmodtab as usize;
            tables.modules = if is_64 {
                data.read_slice_at::<macho::DylibModule64<Endianness>>(modoff, count)
                    .read_error("Invalid Mach-O module table offset or size")?
                    .iter()
                    .map(|m| DylibModule {
                        module_name: m.module_name.get(endian),
                        iextdefsym: m.iextdefsym.get(endian),
                        nextdefsym: m.nextdefsym.get(endian),
                        irefsym: m.irefsym.get(endian),
                        nrefsym: m.nrefsym.get(endian),
                        ilocalsym: m.ilocalsym.get(endian),
                        nlocalsym: m.nlocalsym.get(endian),
                        iextrel: m.iextrel.get(endian),
                        nextrel: m.nextrel.get(endian),
                        iinit_iterm: m.iinit_iterm.get(endian),
                        ninit_nterm: m.ninit_nterm.get(endian),
                        objc_module_info_addr: m.objc_module_info_addr.get(endian),
                        objc_module_info_size: m.objc_module_info_size.get(endian),
                    })
                    .collect()
            } else {
                data.read_slice_at::<macho::DylibModule32<Endianness>>(modoff, count)
                    .read_error("Invalid Mach-O module table offset or size")?
                    .iter()
                    .map(|m| DylibModule {
                        module_name: m.module_name.get(endian),
                        iextdefsym: m.iextdefsym.get(endian),
                        nextdefsym: m.nextdefsym.get(endian),
                        irefsym: m.irefsym.get(endian),
                        nrefsym: m.nrefsym.get(endian),
                        ilocalsym: m.ilocalsym.get(endian),
                        nlocalsym: m.nlocalsym.get(endian),
                        iextrel: m.iextrel.get(endian),
                        nextrel: m.nextrel.get(endian),
                        iinit_iterm: m.iinit_iterm.get(endian),
                        ninit_nterm: m.ninit_nterm.get(endian),
                        objc_module_info_addr: m.objc_module_info_addr.get(endian).into(),
                        objc_module_info_size: m.objc_module_info_size.get(endian),
                    })
                    .collect()
            };
            for module in &tables.modules {
                check_module(module, fields, nsyms)?;
            }
        }

        if fields.ntoc != 0 {
            tables.toc = data
                .read_slice_at::<macho::DylibTableOfContents<Endianness>>(
                    offset + u64::from(fields.tocoff),
                    fields.ntoc as usize,
                )
                .read_error("Invalid Mach-O table of contents offset or size")?
                .iter()
                .map(|entry| TocEntry {
                    symbol_index: entry.symbol_index.get(endian),
                    module_index: entry.module_index.get(endian),
                })
                .collect();
            for entry in &tables.toc {
                if entry.symbol_index >= nsyms {
                    return Err(Error("Invalid Mach-O table of contents symbol index"));
                }
                if entry.module_index >= fields.nmodtab {
                    return Err(Error("Invalid Mach-O table of contents module index"));
                }
            }
        }

        if fields.nextrefsyms != 0 {
            tables.external_refs = data
                .read_slice_at::<macho::DylibReference<Endianness>>(
                    offset + u64::from(fields.extrefsymoff),
                    fields.nextrefsyms as usize,
                )
                .read_error("Invalid Mach-O external reference table offset or size")?
                .iter()
                .map(|reference| DylibReferenceInfo::parse(reference, endian))
                .collect();
        }

        if fields.nindirectsyms != 0 {
            tables.indirect_symbols = data
                .read_slice_at::<U32<Endianness>>(
                    offset + u64::from(fields.indirectsymoff),
                    fields.nindirectsyms as usize,
                )
                .read_error("Invalid Mach-O indirect symbol table offset or size")?
                .iter()
                .map(|index| index.get(endian))
                .collect();
        }

        Ok(tables)
    }

    /// The range of local symbols.
    pub fn local_symbols(&self) -> core::ops::Range<usize> {
        range(self.fields.ilocalsym, self.fields.nlocalsym)
    }

    /// The range of externally defined symbols.
    pub fn external_symbols(&self) -> core::ops::Range<usize> {
        range(self.fields.iextdefsym, self.fields.nextdefsym)
    }

    /// The range of undefined symbols.
    pub fn undefined_symbols(&self) -> core::ops::Range<usize> {
        range(self.fields.iundefsym, self.fields.nundefsym)
    }

    /// Synthesize a `<name>$stub` symbol for each slot of the pointer and
    /// stub sections that refers to a named symbol.
    ///
    /// Slots marked `INDIRECT_SYMBOL_LOCAL` or `INDIRECT_SYMBOL_ABS`, and
    /// slots whose symbol index is out of range, are skipped.
    pub fn stub_symbols(
        &self,
        sections: &[MachOSection],
        symbols: &[MachOSymbol<'_>],
        is_64: bool,
    ) -> Result<Vec<StubSymbol>> {
        let mut stubs = Vec::new();
        for section in sections.iter().filter(|section| section.is_indirect()) {
            let entry_size = section.entry_size(is_64);
            let count = section.indirect_count(is_64);
            let first = section.reserved1 as usize;
            let slots = usize::try_from(count)
                .ok()
                .and_then(|count| first.checked_add(count))
                .and_then(|last| self.indirect_symbols.get(first..last))
                .read_error("Mach-O indirect symbol range exceeds the table")?;
            for (slot, &isym) in slots.iter().enumerate() {
                if isym & (macho::INDIRECT_SYMBOL_LOCAL | macho::INDIRECT_SYMBOL_ABS) != 0 {
                    continue;
                }
                let symbol = match symbols.get(isym as usize) {
                    Some(symbol) if !symbol.name.is_empty() => symbol,
                    _ => continue,
                };
                let mut name = Vec::with_capacity(symbol.name.len() + 5);
                name.extend_from_slice(symbol.name);
                name.extend_from_slice(b"$stub");
                let value = slot as u64 * entry_size;
                stubs.push(StubSymbol {
                    name,
                    section: section.index,
                    value,
                    address: section.addr.wrapping_add(value),
                    symbol: symbol.index,
                });
            }
        }
        Ok(stubs)
    }
}

fn range(start: u32, count: u32) -> core::ops::Range<usize> {
    let start = start as usize;
    start..start.saturating_add(count as usize)
}

/// Check that the local, external and undefined ranges partition the
/// symbol table.
fn check_partition(fields: &Dysymtab, nsyms: u32) -> Result<()> {
    let end_local = fields.ilocalsym.checked_add(fields.nlocalsym);
    let end_extdef = fields.iextdefsym.checked_add(fields.nextdefsym);
    let end_undef = fields.iundefsym.checked_add(fields.nundefsym);
    if fields.ilocalsym != 0
        || end_local != Some(fields.iextdefsym)
        || end_extdef != Some(fields.iundefsym)
        || end_undef != Some(nsyms)
    {
        return Err(Error("Mach-O dysymtab ranges do not partition the symbol table"));
    }
    Ok(())
}

fn check_module(module: &DylibModule, fields: &Dysymtab, nsyms: u32) -> Result<()> {
    let within = |start: u32, count: u32, limit: u32| {
        start.checked_add(count).map_or(false, |end| end <= limit)
    };
    if !within(module.ilocalsym, module.nlocalsym, nsyms)
        || !within(module.iextdefsym, module.nextdefsym, nsyms)
    {
        return Err(Error("Invalid Mach-O module symbol range"));
    }
    if !within(module.irefsym, module.nrefsym, fields.nextrefsyms) {
        return Err(Error("Invalid Mach-O module reference range"));
    }
    if !within(module.iextrel, module.nextrel, fields.nextrel) {
        return Err(Error("Invalid Mach-O module relocation range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(nlocal: u32, nextdef: u32, nundef: u32) -> Dysymtab {
        Dysymtab {
            ilocalsym: 0,
            nlocalsym: nlocal,
            iextdefsym: nlocal,
            nextdefsym: nextdef,
            iundefsym: nlocal + nextdef,
            nundefsym: nundef,
            ..Default::default()
        }
    }

    #[test]
    fn partition() {
        assert!(check_partition(&fields(2, 3, 1), 6).is_ok());
        assert!(check_partition(&fields(2, 3, 1), 7).is_err());
        let mut gap = fields(2, 3, 1);
        gap.iundefsym += 1;
        assert!(check_partition(&gap, 7).is_err());
        let mut overflow = fields(0, 0, 0);
        overflow.nundefsym = u32::MAX;
        overflow.iundefsym = 1;
        overflow.iextdefsym = 0;
        assert!(check_partition(&overflow, 0).is_err());
    }

    #[test]
    fn symbol_ranges_saturate() {
        let mut dysymtab = fields(0, 0, 0);
        dysymtab.iundefsym = u32::MAX;
        dysymtab.nundefsym = u32::MAX;
        let tables = DysymtabTables {
            fields: dysymtab,
            ..Default::default()
        };
        let undefined = tables.undefined_symbols();
        assert_eq!(undefined.start, u32::MAX as usize);
        assert!(undefined.end >= undefined.start);
    }

    #[test]
    fn module_ranges() {
        let mut dysymtab = fields(1, 1, 0);
        dysymtab.nextrel = 2;
        let module = DylibModule {
            ilocalsym: 0,
            nlocalsym: 1,
            iextdefsym: 1,
            nextdefsym: 1,
            iextrel: 1,
            nextrel: 1,
            ..Default::default()
        };
        assert!(check_module(&module, &dysymtab, 2).is_ok());
        let bad = DylibModule {
            nextrel: 2,
            ..module
        };
        assert!(check_module(&bad, &dysymtab, 2).is_err());
        let bad = DylibModule {
            nextdefsym: 2,
            ..module
        };
        assert!(check_module(&bad, &dysymtab, 2).is_err());
    }

    #[test]
    fn toc_indices() {
        let data = [
            // symbol 1, module 0
            0, 0, 0, 1, 0, 0, 0, 0,
            // symbol 5, module 0
            0, 0, 0, 5, 0, 0, 0, 0,
        ];
        let mut dysymtab = fields(0, 2, 0);
        dysymtab.ntoc = 1;
        dysymtab.nmodtab = 0;
        let endian = Endianness::Big;
        // Module index 0 is out of range when there is no module table.
        assert!(DysymtabTables::parse(&data[..], 0, &dysymtab, 2, endian, false).is_err());

        let module = [0u8; 52];
        let mut image = alloc::vec::Vec::new();
        image.extend_from_slice(&data);
        image.extend_from_slice(&module);
        dysymtab.modtaboff = 16;
        dysymtab.nmodtab = 1;
        let tables = DysymtabTables::parse(&image[..], 0, &dysymtab, 2, endian, false).unwrap();
        assert_eq!(tables.toc, [TocEntry { symbol_index: 1, module_index: 0 }]);
        assert_eq!(tables.modules.len(), 1);

        dysymtab.ntoc = 2;
        assert!(DysymtabTables::parse(&image[..], 0, &dysymtab, 2, endian, false).is_err());
    }
}
