use alloc::vec::Vec;
use core::fmt::Debug;
use core::str;

#[cfg(feature = "logging")]
use log::warn;

use crate::endian::{self, Endianness};
use crate::macho;
use crate::pod::Pod;
use crate::read::{Error, ReadError, ReadRef, Result, SectionIndex, StringTable, SymbolIndex};

use super::{MachOSection, Symtab};

/// The section that a symbol is defined relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolSection {
    /// The symbol is not defined in this file.
    Undefined,
    /// The symbol value is absolute.
    Absolute,
    /// The symbol is a common block, with the value holding its size.
    Common,
    /// The symbol is defined in the given section.
    Section(SectionIndex),
}

impl SymbolSection {
    /// Returns the section index, if the symbol is defined in a section.
    #[inline]
    pub fn index(self) -> Option<SectionIndex> {
        if let SymbolSection::Section(index) = self {
            Some(index)
        } else {
            None
        }
    }
}

/// A decoded `nlist` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachOSymbol<'data> {
    /// The index of the symbol in the symbol table.
    pub index: SymbolIndex,
    /// The name of the symbol.
    pub name: &'data [u8],
    /// The value of the symbol.
    ///
    /// This is relative to the section start for symbols defined in a
    /// section, and the size for common symbols.
    pub value: u64,
    /// The section of the symbol.
    pub section: SymbolSection,
    /// Whether the symbol is visible outside of the file.
    pub global: bool,
    /// Whether the symbol is a weak reference or weak definition.
    pub weak: bool,
    /// Whether the symbol is a debugging (stab) entry.
    pub debugging: bool,
    /// The raw `n_strx` field.
    pub n_strx: u32,
    /// The raw `n_type` field.
    pub n_type: u8,
    /// The raw `n_sect` field.
    pub n_sect: u8,
    /// The raw `n_desc` field.
    pub n_desc: u16,
    /// The raw `n_value` field.
    pub n_value: u64,
}

impl<'data> MachOSymbol<'data> {
    /// The symbol name as a string.
    pub fn name(&self) -> Result<&'data str> {
        str::from_utf8(self.name)
            .ok()
            .read_error("Non UTF-8 Mach-O symbol name")
    }

    /// Return true if the symbol is undefined.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.section == SymbolSection::Undefined
    }

    /// Return true if the symbol is a definition of a function or data object.
    #[inline]
    pub fn is_definition(&self) -> bool {
        !self.debugging && matches!(self.section, SymbolSection::Section(_) | SymbolSection::Absolute)
    }

    /// Return true if the symbol is a debugging entry.
    #[inline]
    pub fn is_stab(&self) -> bool {
        self.n_type & macho::N_STAB != 0
    }

    /// The `N_TYPE` bits of `n_type`.
    #[inline]
    pub fn symbol_type(&self) -> u8 {
        self.n_type & macho::N_TYPE
    }

    /// Return true if `N_EXT` is set.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.n_type & macho::N_EXT != 0
    }

    /// Return true if `N_PEXT` is set.
    #[inline]
    pub fn is_private_external(&self) -> bool {
        self.n_type & macho::N_PEXT != 0
    }
}

/// The symbol and string tables of a Mach-O image.
#[derive(Debug, Clone)]
pub struct SymbolTable<'data, R = &'data [u8]>
where
    R: ReadRef<'data>,
{
    symbols: Vec<MachOSymbol<'data>>,
    strings: StringTable<'data, R>,
}

impl<'data, R: ReadRef<'data>> Default for SymbolTable<'data, R> {
    fn default() -> Self {
        SymbolTable {
            symbols: Vec::new(),
            strings: StringTable::default(),
        }
    }
}

impl<'data, R: ReadRef<'data>> SymbolTable<'data, R> {
    /// Read the tables described by `symtab`.
    ///
    /// `offset` is the offset of the image within `data`.
    pub(super) fn parse<Nl: Nlist<Endian = Endianness>>(
        data: R,
        offset: u64,
        symtab: &Symtab,
        endian: Endianness,
        sections: &[MachOSection],
    ) -> Result<Self> {
        let str_start = offset + u64::from(symtab.stroff);
        let str_end = str_start + u64::from(symtab.strsize);
        data.read_bytes_at(str_start, symtab.strsize.into())
            .read_error("Invalid Mach-O string table offset or size")?;
        let strings = StringTable::new(data, str_start, str_end);
        let nlists = data
            .read_slice_at::<Nl>(offset + u64::from(symtab.symoff), symtab.nsyms as usize)
            .read_error("Invalid Mach-O symbol table offset or size")?;
        let mut symbols = Vec::with_capacity(nlists.len());
        for (index, nlist) in nlists.iter().enumerate() {
            symbols.push(parse_symbol(
                nlist,
                endian,
                SymbolIndex(index),
                &strings,
                symtab.strsize,
                sections,
            )?);
        }
        Ok(SymbolTable { symbols, strings })
    }

    /// The number of symbols.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Return true if there are no symbols.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbols in table order.
    #[inline]
    pub fn symbols(&self) -> &[MachOSymbol<'data>] {
        &self.symbols
    }

    /// The string table.
    #[inline]
    pub fn strings(&self) -> StringTable<'data, R> {
        self.strings
    }

    /// Return the symbol at the given index.
    pub fn symbol(&self, index: SymbolIndex) -> Result<&MachOSymbol<'data>> {
        self.symbols
            .get(index.0)
            .read_error("Invalid Mach-O symbol index")
    }

    /// Return the first symbol with the given name.
    pub fn symbol_by_name(&self, name: &[u8]) -> Option<&MachOSymbol<'data>> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }
}

fn parse_symbol<'data, Nl: Nlist<Endian = Endianness>, R: ReadRef<'data>>(
    nlist: &Nl,
    endian: Endianness,
    index: SymbolIndex,
    strings: &StringTable<'data, R>,
    strsize: u32,
    sections: &[MachOSection],
) -> Result<MachOSymbol<'data>> {
    let n_strx = nlist.n_strx(endian);
    let n_type = nlist.n_type();
    let n_sect = nlist.n_sect();
    let n_desc = nlist.n_desc(endian);
    let n_value: u64 = nlist.n_value(endian).into();
    if n_strx >= strsize {
        return Err(Error("Mach-O symbol name offset is past the string table"));
    }
    let name = strings
        .get(n_strx)
        .read_error("Unterminated Mach-O symbol name")?;

    let mut symbol = MachOSymbol {
        index,
        name,
        value: n_value,
        section: SymbolSection::Undefined,
        global: false,
        weak: false,
        debugging: false,
        n_strx,
        n_type,
        n_sect,
        n_desc,
        n_value,
    };

    if n_type & macho::N_STAB != 0 {
        symbol.debugging = true;
        match n_type {
            macho::N_FUN
            | macho::N_STSYM
            | macho::N_LCSYM
            | macho::N_BNSYM
            | macho::N_SLINE
            | macho::N_ENSYM
            | macho::N_ECOMM
            | macho::N_ECOML
            | macho::N_GSYM => {
                if let Some(section) = section_at(sections, n_sect) {
                    symbol.section = SymbolSection::Section(section.index);
                    symbol.value = n_value.wrapping_sub(section.addr);
                }
            }
            _ => {}
        }
        return Ok(symbol);
    }

    symbol.global = n_type & (macho::N_EXT | macho::N_PEXT) != 0;
    match n_type & macho::N_TYPE {
        macho::N_UNDF => {
            if n_type & macho::N_EXT != 0 && n_value != 0 {
                symbol.section = SymbolSection::Common;
            } else {
                symbol.weak = n_desc & macho::N_WEAK_REF != 0;
            }
        }
        macho::N_PBUD => {}
        macho::N_ABS => symbol.section = SymbolSection::Absolute,
        macho::N_SECT => match section_at(sections, n_sect) {
            Some(section) => {
                symbol.section = SymbolSection::Section(section.index);
                symbol.value = n_value.wrapping_sub(section.addr);
                symbol.weak = n_desc & macho::N_WEAK_DEF != 0;
            }
            None => {
                #[cfg(feature = "logging")]
                warn!(
                    "Mach-O symbol {} has invalid section number {}",
                    index, n_sect
                );
            }
        },
        _ => {
            #[cfg(feature = "logging")]
            warn!(
                "Mach-O symbol {} has unsupported type {:#x}",
                index, n_type
            );
        }
    }
    Ok(symbol)
}

fn section_at(sections: &[MachOSection], n_sect: u8) -> Option<&MachOSection> {
    if n_sect == macho::NO_SECT {
        None
    } else {
        sections.get(usize::from(n_sect) - 1)
    }
}

/// A trait for generic access to [`macho::Nlist32`] and [`macho::Nlist64`].
#[allow(missing_docs)]
pub trait Nlist: Debug + Pod {
    type Word: Into<u64>;
    type Endian: endian::Endian;

    fn n_strx(&self, endian: Self::Endian) -> u32;
    fn n_type(&self) -> u8;
    fn n_sect(&self) -> u8;
    fn n_desc(&self, endian: Self::Endian) -> u16;
    fn n_value(&self, endian: Self::Endian) -> Self::Word;
}

impl<Endian: endian::Endian> Nlist for macho::Nlist32<Endian> {
    type Word = u32;
    type Endian = Endian;

    fn n_strx(&self, endian: Self::Endian) -> u32 {
        self.n_strx.get(endian)
    }
    fn n_type(&self) -> u8 {
        self.n_type
    }
    fn n_sect(&self) -> u8 {
        self.n_sect
    }
    fn n_desc(&self, endian: Self::Endian) -> u16 {
        self.n_desc.get(endian)
    }
    fn n_value(&self, endian: Self::Endian) -> Self::Word {
        self.n_value.get(endian)
    }
}

impl<Endian: endian::Endian> Nlist for macho::Nlist64<Endian> {
    type Word = u64;
    type Endian = Endian;

    fn n_strx(&self, endian: Self::Endian) -> u32 {
        self.n_strx.get(endian)
    }
    fn n_type(&self) -> u8 {
        self.n_type
    }
    fn n_sect(&self) -> u8 {
        self.n_sect
    }
    fn n_desc(&self, endian: Self::Endian) -> u16 {
        self.n_desc.get(endian)
    }
    fn n_value(&self, endian: Self::Endian) -> Self::Word {
        self.n_value.get(endian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{U16, U32};

    fn nlist(n_strx: u32, n_type: u8, n_sect: u8, n_desc: u16, n_value: u32) -> macho::Nlist32<Endianness> {
        let e = Endianness::Little;
        macho::Nlist32 {
            n_strx: U32::new(e, n_strx),
            n_type,
            n_sect,
            n_desc: U16::new(e, n_desc),
            n_value: U32::new(e, n_value),
        }
    }

    fn decode(nlist: &macho::Nlist32<Endianness>) -> Result<MachOSymbol<'static>> {
        let data: &'static [u8] = b"\0_foo\0_bar\0";
        let strings = StringTable::new(data, 0, data.len() as u64);
        parse_symbol(
            nlist,
            Endianness::Little,
            SymbolIndex(0),
            &strings,
            data.len() as u32,
            &[],
        )
    }

    #[test]
    fn symbol_kinds() {
        let undef = decode(&nlist(1, macho::N_UNDF | macho::N_EXT, 0, macho::N_WEAK_REF, 0)).unwrap();
        assert_eq!(undef.name, b"_foo");
        assert!(undef.is_undefined());
        assert!(undef.global);
        assert!(undef.weak);

        let common = decode(&nlist(6, macho::N_UNDF | macho::N_EXT, 0, 0, 16)).unwrap();
        assert_eq!(common.section, SymbolSection::Common);
        assert_eq!(common.value, 16);

        let abs = decode(&nlist(6, macho::N_ABS, 0, 0, 0x1234)).unwrap();
        assert_eq!(abs.section, SymbolSection::Absolute);
        assert!(!abs.global);
        assert_eq!(abs.value, 0x1234);

        let private = decode(&nlist(6, macho::N_PBUD | macho::N_PEXT, 0, 0, 0)).unwrap();
        assert!(private.is_undefined());
        assert!(private.global);
        assert!(private.is_private_external());

        let stab = decode(&nlist(0, macho::N_SO, 0, 0, 0)).unwrap();
        assert!(stab.debugging);
        assert!(stab.is_stab());
        assert_eq!(stab.name, b"");
    }

    #[test]
    fn soft_section_failure() {
        let symbol = decode(&nlist(1, macho::N_SECT | macho::N_EXT, 3, 0, 0x10)).unwrap();
        assert!(symbol.is_undefined());
        assert_eq!(symbol.n_sect, 3);
    }

    #[test]
    fn bad_names() {
        assert!(decode(&nlist(11, macho::N_ABS, 0, 0, 0)).is_err());
        assert!(decode(&nlist(100, macho::N_ABS, 0, 0, 0)).is_err());
    }
}
