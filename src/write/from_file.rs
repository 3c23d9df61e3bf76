use alloc::borrow::Cow;

use crate::common::Arch;
use crate::macho;
use crate::read::macho::{LoadCommandVariant, MachOFile, SymbolSection as ReadSymbolSection};
use crate::read::ReadRef;
use crate::reloc::{InfoFields, RelocationInfo};
use crate::write::{
    Command, Error, IndirectSymbol, Object, Relocation, RelocationTarget, Result, SectionId,
    Symbol, SymbolId, SymbolSection,
};

impl<'data> Object<'data> {
    /// Rebuild an object from a parsed relocatable file.
    ///
    /// Symbols keep their file order and their raw `n_type`, `n_sect` and
    /// `n_desc`, and relocations keep their raw fields, so writing an object
    /// that was produced by [`Object::write`] reproduces the same bytes.
    ///
    /// Files with more than one segment, multi-module dylib tables, or an
    /// indirect symbol table that is not laid out in section order are
    /// rejected.
    pub fn from_file<R: ReadRef<'data>>(file: &MachOFile<'data, R>) -> Result<Object<'data>> {
        let header = file.header();
        let mut object = Object::new(header.cputype, header.cpusubtype, header.endian);
        object.filetype = header.filetype;
        object.flags = header.flags;
        object.is_64 = header.is_64;

        if file.segments().count() > 1 {
            return Err(Error::not_implemented("multiple segments"));
        }
        for command in file.commands() {
            let command = match command.variant {
                LoadCommandVariant::Segment(_)
                | LoadCommandVariant::Symtab(_)
                | LoadCommandVariant::Dysymtab(_) => continue,
                LoadCommandVariant::Uuid(uuid) => Command::Uuid(uuid),
                LoadCommandVariant::VersionMin(version) => Command::VersionMin {
                    cmd: command.raw_cmd(),
                    version: version.version,
                    sdk: version.sdk,
                },
                LoadCommandVariant::SourceVersion(version) => Command::SourceVersion(version),
                _ => Command::Opaque {
                    cmd: command.raw_cmd(),
                    data: command.data.get(8..).unwrap_or(&[]).to_vec(),
                },
            };
            object.commands.push(command);
        }

        for section in file.sections() {
            let id = object.add_section(
                section.segment_name().to_vec(),
                section.name().to_vec(),
                section.flags,
            );
            let out = object.section_mut(id);
            out.align = section.align;
            out.reserved1 = section.reserved1;
            out.reserved2 = section.reserved2;
            out.reserved3 = section.reserved3;
            if section.is_zerofill() {
                out.size = section.size;
            } else {
                let data = file.section_data(section)?;
                out.data = Cow::Borrowed(data);
                out.size = data.len() as u64;
            }
        }

        let symbols = file.symbols()?;
        for symbol in symbols.symbols() {
            let section = match symbol.section {
                ReadSymbolSection::Undefined => SymbolSection::Undefined,
                ReadSymbolSection::Absolute => SymbolSection::Absolute,
                ReadSymbolSection::Common => SymbolSection::Common,
                ReadSymbolSection::Section(index) => SymbolSection::Section(SectionId(index.0 - 1)),
            };
            object.add_symbol(Symbol {
                name: symbol.name.to_vec(),
                value: symbol.value,
                section,
                global: symbol.global,
                weak: symbol.weak,
                n_type: Some(symbol.n_type),
                n_sect: Some(symbol.n_sect),
                n_desc: Some(symbol.n_desc),
            });
        }
        let nsyms = symbols.len();
        let nsects = file.sections().len();

        let arch = file.architecture();
        for (index, section) in file.sections().iter().enumerate() {
            for info in file.relocation_infos(section)? {
                let relocation = Relocation {
                    address: info.address,
                    fields: InfoFields {
                        r_type: info.r_type,
                        length: info.length,
                        pcrel: info.pcrel,
                    },
                    target: relocation_target(&info, arch, nsyms, nsects),
                };
                object.add_relocation(SectionId(index), relocation)?;
            }
        }

        if let Some(tables) = file.dysymtab()? {
            let fields = &tables.fields;
            if fields.ntoc != 0
                || fields.nmodtab != 0
                || fields.nextrefsyms != 0
                || fields.nextrel != 0
                || fields.nlocrel != 0
            {
                return Err(Error::not_implemented("dynamic library tables"));
            }
            let table = &tables.indirect_symbols;
            let mut next = 0;
            for (index, section) in file.sections().iter().enumerate() {
                if !section.is_indirect() {
                    continue;
                }
                let count = section.indirect_count(header.is_64) as usize;
                if count == 0 {
                    continue;
                }
                let start = section.reserved1 as usize;
                let entries = table
                    .get(start..)
                    .and_then(|entries| entries.get(..count))
                    .ok_or_else(|| Error::new("Invalid indirect symbol range"))?;
                if start != next {
                    return Err(Error::not_implemented("unordered indirect symbol table"));
                }
                next += count;
                for &entry in entries {
                    object.add_indirect_symbol(SectionId(index), indirect_symbol(entry, nsyms));
                }
            }
            if next != table.len() {
                return Err(Error::not_implemented("unreferenced indirect symbols"));
            }
        }

        Ok(object)
    }
}

fn relocation_target(
    info: &RelocationInfo,
    arch: Arch,
    nsyms: usize,
    nsects: usize,
) -> RelocationTarget {
    if info.scattered {
        return RelocationTarget::Scattered { value: info.value };
    }
    let raw = RelocationTarget::Raw {
        r_extern: info.r_extern,
        symbolnum: info.symbolnum,
    };
    if arch == Arch::Arm64 && info.r_type == macho::ARM64_RELOC_ADDEND {
        return raw;
    }
    let symbolnum = info.symbolnum as usize;
    if info.r_extern {
        if symbolnum < nsyms {
            RelocationTarget::Symbol(SymbolId(symbolnum))
        } else {
            raw
        }
    } else if symbolnum == usize::from(macho::R_ABS) {
        RelocationTarget::Absolute
    } else if symbolnum <= nsects {
        RelocationTarget::Section(SectionId(symbolnum - 1))
    } else {
        raw
    }
}

fn indirect_symbol(entry: u32, nsyms: usize) -> IndirectSymbol {
    const LOCAL_ABS: u32 = macho::INDIRECT_SYMBOL_LOCAL | macho::INDIRECT_SYMBOL_ABS;
    match entry {
        macho::INDIRECT_SYMBOL_LOCAL => IndirectSymbol::Local,
        LOCAL_ABS => IndirectSymbol::Absolute,
        _ if (entry as usize) < nsyms => IndirectSymbol::Symbol(SymbolId(entry as usize)),
        _ => IndirectSymbol::Raw(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reloc::{Arm64Reloc, RelocationKind};

    #[test]
    fn raw_targets() {
        let fields = RelocationKind::Arm64(Arm64Reloc::Addend).to_info_fields();
        let addend = RelocationInfo::plain(0, fields, false, 2);
        assert_eq!(
            relocation_target(&addend, Arch::Arm64, 4, 4),
            RelocationTarget::Raw {
                r_extern: false,
                symbolnum: 2
            }
        );
        let fields = RelocationKind::Arm64(Arm64Reloc::Unsigned64).to_info_fields();
        let local = RelocationInfo::plain(0, fields, false, 2);
        assert_eq!(
            relocation_target(&local, Arch::Arm64, 4, 4),
            RelocationTarget::Section(SectionId(1))
        );
        let external = RelocationInfo::plain(0, fields, true, 7);
        assert_eq!(
            relocation_target(&external, Arch::Arm64, 4, 4),
            RelocationTarget::Raw {
                r_extern: true,
                symbolnum: 7
            }
        );
    }

    #[test]
    fn indirect_entries() {
        assert_eq!(indirect_symbol(1, 2), IndirectSymbol::Symbol(SymbolId(1)));
        assert_eq!(indirect_symbol(2, 2), IndirectSymbol::Raw(2));
        assert_eq!(
            indirect_symbol(macho::INDIRECT_SYMBOL_LOCAL, 2),
            IndirectSymbol::Local
        );
        assert_eq!(
            indirect_symbol(macho::INDIRECT_SYMBOL_LOCAL | macho::INDIRECT_SYMBOL_ABS, 2),
            IndirectSymbol::Absolute
        );
    }
}
