//! Relocation decoding and canonicalization.
//!
//! A raw 8-byte relocation record is first expanded into a
//! [`RelocationInfo`], which is independent of the architecture. The
//! architecture backend selected by [`Arch`] then maps it to a
//! [`RelocationKind`], resolves its target, and merges PAIR and ADDEND
//! records into their predecessor.

use core::fmt;

use crate::endian::Endian;
use crate::macho;

pub use crate::common::Arch;

mod arm;
pub use arm::*;

mod arm64;
pub use arm64::*;

mod generic;
pub use generic::*;

mod x86_64;
pub use x86_64::*;

/// The position of a bit-field within a 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// The shift of the least significant bit.
    pub shift: u32,
    /// The mask applied after shifting.
    pub mask: u32,
}

impl BitField {
    const fn new(shift: u32, mask: u32) -> Self {
        BitField { shift, mask }
    }

    /// Extract this field from a word.
    #[inline]
    pub fn get(self, word: u32) -> u32 {
        (word >> self.shift) & self.mask
    }

    /// Insert a value for this field into a word.
    ///
    /// Bits of `value` outside the mask are discarded.
    #[inline]
    pub fn put(self, word: u32, value: u32) -> u32 {
        (word & !(self.mask << self.shift)) | ((value & self.mask) << self.shift)
    }
}

/// The bit-field layout of the second word of a non-scattered relocation,
/// and of a dylib reference table entry.
///
/// The C declarations use bit-fields, so the positions depend on the byte
/// order of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    /// The 24-bit symbol or section number.
    pub symbolnum: BitField,
    /// The pc-relative flag.
    pub pcrel: BitField,
    /// The length code.
    pub length: BitField,
    /// The extern flag.
    pub r_extern: BitField,
    /// The relocation type.
    pub r_type: BitField,
    /// The 8-bit flags of a dylib reference.
    pub flags: BitField,
}

/// The layout used by big-endian files.
pub static BIG_ENDIAN_LAYOUT: BitLayout = BitLayout {
    symbolnum: BitField::new(8, 0x00ff_ffff),
    pcrel: BitField::new(7, 0x1),
    length: BitField::new(5, 0x3),
    r_extern: BitField::new(4, 0x1),
    r_type: BitField::new(0, 0xf),
    flags: BitField::new(0, 0xff),
};

/// The layout used by little-endian files.
pub static LITTLE_ENDIAN_LAYOUT: BitLayout = BitLayout {
    symbolnum: BitField::new(0, 0x00ff_ffff),
    pcrel: BitField::new(24, 0x1),
    length: BitField::new(25, 0x3),
    r_extern: BitField::new(27, 0x1),
    r_type: BitField::new(28, 0xf),
    flags: BitField::new(24, 0xff),
};

impl BitLayout {
    /// Select the layout for a byte order.
    #[inline]
    pub fn for_endian<E: Endian>(endian: E) -> &'static BitLayout {
        if endian.is_big_endian() {
            &BIG_ENDIAN_LAYOUT
        } else {
            &LITTLE_ENDIAN_LAYOUT
        }
    }
}

/// The expanded form of a relocation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelocationInfo {
    /// The offset in the section of the place to relocate.
    ///
    /// Only 24 bits are available for scattered relocations.
    pub address: u32,
    /// Whether this is a scattered relocation.
    pub scattered: bool,
    /// The architecture specific relocation type.
    pub r_type: u8,
    /// Whether the value is relative to the place.
    pub pcrel: bool,
    /// The size of the place: 0=byte, 1=word, 2=long, 3=quad.
    pub length: u8,
    /// Whether `symbolnum` is a symbol index instead of a section number.
    ///
    /// Always false for scattered relocations.
    pub r_extern: bool,
    /// The symbol index or 1-based section number.
    ///
    /// Always zero for scattered relocations.
    pub symbolnum: u32,
    /// The address of the target of a scattered relocation.
    ///
    /// Always zero for non-scattered relocations.
    pub value: u32,
}

impl RelocationInfo {
    /// Construct a non-scattered relocation.
    pub fn plain(
        address: u32,
        fields: InfoFields,
        r_extern: bool,
        symbolnum: u32,
    ) -> RelocationInfo {
        RelocationInfo {
            address,
            scattered: false,
            r_type: fields.r_type,
            pcrel: fields.pcrel,
            length: fields.length,
            r_extern,
            symbolnum: symbolnum & 0x00ff_ffff,
            value: 0,
        }
    }

    /// Construct a scattered relocation.
    pub fn scattered(address: u32, fields: InfoFields, value: u32) -> RelocationInfo {
        RelocationInfo {
            address: address & 0x00ff_ffff,
            scattered: true,
            r_type: fields.r_type,
            pcrel: fields.pcrel,
            length: fields.length,
            r_extern: false,
            symbolnum: 0,
            value,
        }
    }

    /// Decode a raw relocation record.
    pub fn parse<E: Endian>(raw: &macho::Relocation<E>, endian: E) -> RelocationInfo {
        Self::from_words(
            raw.r_word0.get(endian),
            raw.r_word1.get(endian),
            BitLayout::for_endian(endian),
        )
    }

    /// Decode the two words of a relocation record.
    pub fn from_words(word0: u32, word1: u32, layout: &BitLayout) -> RelocationInfo {
        if word0 & macho::R_SCATTERED != 0 {
            RelocationInfo {
                address: word0 & 0x00ff_ffff,
                scattered: true,
                r_type: ((word0 >> 24) & 0xf) as u8,
                pcrel: word0 & 0x4000_0000 != 0,
                length: ((word0 >> 28) & 0x3) as u8,
                r_extern: false,
                symbolnum: 0,
                value: word1,
            }
        } else {
            RelocationInfo {
                address: word0,
                scattered: false,
                r_type: layout.r_type.get(word1) as u8,
                pcrel: layout.pcrel.get(word1) != 0,
                length: layout.length.get(word1) as u8,
                r_extern: layout.r_extern.get(word1) != 0,
                symbolnum: layout.symbolnum.get(word1),
                value: 0,
            }
        }
    }

    /// Encode the two words of a relocation record.
    pub fn to_words(&self, layout: &BitLayout) -> (u32, u32) {
        if self.scattered {
            let word0 = macho::R_SCATTERED
                | (u32::from(self.pcrel) << 30)
                | (u32::from(self.length & 0x3) << 28)
                | (u32::from(self.r_type & 0xf) << 24)
                | (self.address & 0x00ff_ffff);
            (word0, self.value)
        } else {
            let mut word1 = 0;
            word1 = layout.symbolnum.put(word1, self.symbolnum);
            word1 = layout.pcrel.put(word1, u32::from(self.pcrel));
            word1 = layout.length.put(word1, u32::from(self.length));
            word1 = layout.r_extern.put(word1, u32::from(self.r_extern));
            word1 = layout.r_type.put(word1, u32::from(self.r_type));
            (self.address, word1)
        }
    }

    /// Encode a raw relocation record.
    pub fn to_raw<E: Endian>(&self, endian: E) -> macho::Relocation<E> {
        let (word0, word1) = self.to_words(BitLayout::for_endian(endian));
        macho::Relocation {
            r_word0: crate::endian::U32::new(endian, word0),
            r_word1: crate::endian::U32::new(endian, word1),
        }
    }

    /// The size of the place in bytes.
    #[inline]
    pub fn size(&self) -> u8 {
        1 << self.length
    }

    /// The `(length << 1) | pcrel` selector used by the vanilla tables.
    #[inline]
    pub(crate) fn length_pcrel(&self) -> u8 {
        (self.length << 1) | u8::from(self.pcrel)
    }
}

/// A decoded dylib reference table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DylibReferenceInfo {
    /// The index of the referenced symbol.
    pub isym: u32,
    /// The `REFERENCE_FLAG_*` value.
    pub flags: u8,
}

impl DylibReferenceInfo {
    /// Decode a reference table entry.
    pub fn parse<E: Endian>(raw: &macho::DylibReference<E>, endian: E) -> DylibReferenceInfo {
        Self::from_word(raw.bitfield.get(endian), BitLayout::for_endian(endian))
    }

    /// Decode the word of a reference table entry.
    pub fn from_word(word: u32, layout: &BitLayout) -> DylibReferenceInfo {
        DylibReferenceInfo {
            isym: layout.symbolnum.get(word),
            flags: layout.flags.get(word) as u8,
        }
    }

    /// Encode the word of a reference table entry.
    pub fn to_word(&self, layout: &BitLayout) -> u32 {
        let word = layout.symbolnum.put(0, self.isym);
        layout.flags.put(word, u32::from(self.flags))
    }
}

/// The type, length and pc-relative fields that identify a relocation kind
/// in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoFields {
    /// The relocation type.
    pub r_type: u8,
    /// The length code.
    pub length: u8,
    /// The pc-relative flag.
    pub pcrel: bool,
}

impl InfoFields {
    pub(crate) const fn new(r_type: u8, length: u8, pcrel: bool) -> Self {
        InfoFields {
            r_type,
            length,
            pcrel,
        }
    }
}

/// How overflow of a relocated value is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Overflow is not checked.
    Dont,
    /// The value must fit as either a signed or unsigned value.
    Bitfield,
    /// The value must fit as a signed value.
    Signed,
}

/// The decode and encode properties of a relocation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Howto {
    /// The name of the relocation kind.
    pub name: &'static str,
    /// The size of the place in bytes.
    pub size: u8,
    /// The number of bits of the value stored in the place.
    pub bits: u8,
    /// The value is shifted right by this many bits before it is stored.
    pub rightshift: u8,
    /// Whether the value is relative to the place.
    pub pcrel: bool,
    /// The overflow policy.
    pub overflow: Overflow,
    /// The bits of the place that hold the implicit addend.
    pub src_mask: u64,
    /// The bits of the place that are replaced by the value.
    pub dst_mask: u64,
}

impl Howto {
    pub(crate) const fn new(
        name: &'static str,
        size: u8,
        bits: u8,
        rightshift: u8,
        pcrel: bool,
        overflow: Overflow,
        mask: u64,
    ) -> Howto {
        Howto {
            name,
            size,
            bits,
            rightshift,
            pcrel,
            overflow,
            src_mask: mask,
            dst_mask: mask,
        }
    }

    pub(crate) const fn with_masks(mut self, src_mask: u64, dst_mask: u64) -> Howto {
        self.src_mask = src_mask;
        self.dst_mask = dst_mask;
        self
    }
}

/// The canonical kind of a relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationKind {
    /// A generic or i386 relocation.
    Generic(GenericReloc),
    /// An ARM relocation.
    Arm(ArmReloc),
    /// An ARM64 relocation.
    Arm64(Arm64Reloc),
    /// An x86-64 relocation.
    #[allow(non_camel_case_types)]
    X86_64(X86_64Reloc),
}

impl RelocationKind {
    /// The howto entry of this kind.
    pub fn howto(self) -> &'static Howto {
        match self {
            RelocationKind::Generic(kind) => kind.howto(),
            RelocationKind::Arm(kind) => kind.howto(),
            RelocationKind::Arm64(kind) => kind.howto(),
            RelocationKind::X86_64(kind) => kind.howto(),
        }
    }

    /// The record fields that select this kind.
    pub fn to_info_fields(self) -> InfoFields {
        match self {
            RelocationKind::Generic(kind) => kind.to_info_fields(),
            RelocationKind::Arm(kind) => kind.to_info_fields(),
            RelocationKind::Arm64(kind) => kind.to_info_fields(),
            RelocationKind::X86_64(kind) => kind.to_info_fields(),
        }
    }

    /// Return true if a record of this kind must be followed by a
    /// companion record.
    pub fn needs_successor(self) -> bool {
        match self {
            RelocationKind::Generic(kind) => kind.needs_pair(),
            RelocationKind::Arm(kind) => kind.needs_pair(),
            RelocationKind::Arm64(kind) => kind.needs_successor(),
            RelocationKind::X86_64(kind) => kind.needs_successor(),
        }
    }

    /// Return true if this kind is the second half of a pair.
    pub fn is_pair(self) -> bool {
        match self {
            RelocationKind::Generic(kind) => kind.is_pair(),
            RelocationKind::Arm(kind) => kind.is_pair(),
            RelocationKind::Arm64(_) | RelocationKind::X86_64(_) => false,
        }
    }
}

impl fmt::Display for RelocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.howto().name)
    }
}

/// The target of a canonical relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationTarget {
    /// A symbol, by index in the symbol table.
    Symbol(u32),
    /// A section, by 1-based Mach-O section number.
    Section(u32),
    /// An absolute value held in the addend.
    Absolute,
    /// An external relocation with a symbol index past the end of the
    /// symbol table.
    Undefined,
}

/// A canonical relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// The offset in the section of the place to relocate.
    ///
    /// For the second record of a pair this is the address of the first.
    pub address: u64,
    /// The relocation kind.
    pub kind: RelocationKind,
    /// The relocation target.
    pub target: RelocationTarget,
    /// The addend.
    pub addend: i64,
    /// The record this relocation was decoded from.
    pub info: RelocationInfo,
}

impl Relocation {
    /// The howto entry of this relocation.
    #[inline]
    pub fn howto(&self) -> &'static Howto {
        self.kind.howto()
    }
}

/// The address range of a section, used to resolve relocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionBounds {
    /// The address of the section.
    pub address: u64,
    /// The size of the section.
    pub size: u64,
}

/// The tables that relocation targets are resolved against.
#[derive(Debug, Clone, Copy)]
pub struct RelocationContext<'a> {
    /// The architecture backend.
    pub arch: Arch,
    /// The sections in Mach-O section number order.
    pub sections: &'a [SectionBounds],
    /// The number of entries in the symbol table.
    pub symbol_count: usize,
}

/// The place that a backend may adjust while canonicalizing a record.
#[derive(Debug)]
pub(crate) struct Site {
    pub address: u64,
    pub addend: i64,
}

impl<'a> RelocationContext<'a> {
    /// Resolve the generic target of a record.
    ///
    /// Returns the target and the initial addend.
    pub fn resolve_target(&self, info: &RelocationInfo) -> Result<(RelocationTarget, i64), &'static str> {
        if info.scattered {
            let value = u64::from(info.value);
            for (index, section) in self.sections.iter().enumerate() {
                if value >= section.address && value - section.address < section.size {
                    let addend = value.wrapping_sub(section.address) as i64;
                    return Ok((RelocationTarget::Section(index as u32 + 1), addend));
                }
            }
            Ok((RelocationTarget::Absolute, value as i64))
        } else if info.r_extern {
            if (info.symbolnum as usize) < self.symbol_count {
                Ok((RelocationTarget::Symbol(info.symbolnum), 0))
            } else {
                Ok((RelocationTarget::Undefined, 0))
            }
        } else if info.symbolnum == 0 || info.symbolnum == macho::R_NO_TARGET {
            Ok((RelocationTarget::Absolute, 0))
        } else if let Some(section) = self.sections.get(info.symbolnum as usize - 1) {
            Ok((
                RelocationTarget::Section(info.symbolnum),
                (section.address as i64).wrapping_neg(),
            ))
        } else {
            Err("Invalid Mach-O relocation section number")
        }
    }

    /// Canonicalize one record.
    ///
    /// `prev` is the previously decoded relocation of the same section, if any.
    /// It may be modified when this record is the second half of a pair.
    pub fn decode(
        &self,
        info: RelocationInfo,
        prev: Option<&mut Relocation>,
    ) -> Result<Relocation, &'static str> {
        let (target, addend) = if self.arch == Arch::Arm64 && arm64::is_addend(&info) {
            (RelocationTarget::Absolute, arm64::addend_value(&info))
        } else {
            self.resolve_target(&info)?
        };
        let mut site = Site {
            address: u64::from(info.address),
            addend,
        };
        let kind = match self.arch {
            Arch::Generic | Arch::I386 => {
                RelocationKind::Generic(generic::canonicalize(self.arch, &info, &mut site, prev)?)
            }
            Arch::Arm => RelocationKind::Arm(arm::canonicalize(&info, &mut site, prev)?),
            Arch::Arm64 => RelocationKind::Arm64(arm64::canonicalize(&info, &mut site, prev)?),
            Arch::X86_64 => RelocationKind::X86_64(x86_64::canonicalize(&info, &mut site, prev)?),
        };
        Ok(Relocation {
            address: site.address,
            kind,
            target,
            addend: site.addend,
            info,
        })
    }

    /// Canonicalize all records of a section, in file order.
    pub fn decode_all<I>(&self, infos: I) -> Result<alloc::vec::Vec<Relocation>, &'static str>
    where
        I: IntoIterator<Item = RelocationInfo>,
    {
        let mut relocations: alloc::vec::Vec<Relocation> = alloc::vec::Vec::new();
        for info in infos {
            let reloc = self.decode(info, relocations.last_mut())?;
            relocations.push(reloc);
        }
        if let Some(last) = relocations.last() {
            if last.kind.needs_successor() {
                return Err("Mach-O relocation is missing its companion record");
            }
        }
        Ok(relocations)
    }
}

/// Check that `prev`, if it needs a successor, is completed by `current`.
pub(crate) fn check_successor(
    prev: Option<&Relocation>,
    current_is_pair: bool,
) -> Result<(), &'static str> {
    match prev {
        Some(prev) if prev.kind.needs_successor() && !current_is_pair => {
            Err("Mach-O relocation is missing its companion record")
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{BigEndian, Endianness, LittleEndian};

    #[test]
    fn bit_layouts() {
        // symbolnum=0x123456, pcrel, length=2, extern, type=5
        let word = 0x1234_56d5;
        let info = RelocationInfo::from_words(0x10, word, &BIG_ENDIAN_LAYOUT);
        assert_eq!(info.symbolnum, 0x12_3456);
        assert!(info.pcrel);
        assert_eq!(info.length, 2);
        assert!(info.r_extern);
        assert_eq!(info.r_type, 5);
        assert_eq!(info.to_words(&BIG_ENDIAN_LAYOUT), (0x10, word));

        let word = 0x5d12_3456;
        let info = RelocationInfo::from_words(0x10, word, &LITTLE_ENDIAN_LAYOUT);
        assert_eq!(info.symbolnum, 0x12_3456);
        assert!(info.pcrel);
        assert_eq!(info.length, 2);
        assert!(info.r_extern);
        assert_eq!(info.r_type, 5);
        assert_eq!(info.to_words(&LITTLE_ENDIAN_LAYOUT), (0x10, word));
    }

    #[test]
    fn scattered_words() {
        // scattered, pcrel, length=2, type=2 (SECTDIFF), address=0x20
        let info = RelocationInfo::from_words(0xe200_0020, 0x1000, &LITTLE_ENDIAN_LAYOUT);
        assert!(info.scattered);
        assert!(info.pcrel);
        assert_eq!(info.length, 2);
        assert_eq!(info.r_type, 2);
        assert_eq!(info.address, 0x20);
        assert_eq!(info.value, 0x1000);
        // The scattered layout does not depend on the byte order.
        assert_eq!(
            info.to_words(&BIG_ENDIAN_LAYOUT),
            (0xe200_0020, 0x1000)
        );
    }

    #[test]
    fn raw_records() {
        let info = RelocationInfo::plain(0x8, InfoFields::new(0, 2, false), true, 3);
        let raw = info.to_raw(BigEndian);
        assert_eq!(crate::pod::bytes_of(&raw), &[0, 0, 0, 8, 0, 0, 3, 0x50]);
        assert_eq!(RelocationInfo::parse(&raw, BigEndian), info);

        let raw = info.to_raw(LittleEndian);
        assert_eq!(crate::pod::bytes_of(&raw), &[8, 0, 0, 0, 3, 0, 0, 0x0c]);
        assert_eq!(RelocationInfo::parse(&raw, LittleEndian), info);
    }

    #[test]
    fn dylib_references() {
        let reference = DylibReferenceInfo { isym: 0x42, flags: 1 };
        assert_eq!(reference.to_word(&BIG_ENDIAN_LAYOUT), 0x0000_4201);
        assert_eq!(reference.to_word(&LITTLE_ENDIAN_LAYOUT), 0x0100_0042);
        assert_eq!(
            DylibReferenceInfo::from_word(0x0100_0042, &LITTLE_ENDIAN_LAYOUT),
            reference
        );
        assert_eq!(
            DylibReferenceInfo::from_word(0x0000_4201, &BIG_ENDIAN_LAYOUT),
            reference
        );
    }

    fn context(arch: Arch) -> RelocationContext<'static> {
        static SECTIONS: [SectionBounds; 2] = [
            SectionBounds {
                address: 0,
                size: 0x10,
            },
            SectionBounds {
                address: 0x10,
                size: 0x20,
            },
        ];
        RelocationContext {
            arch,
            sections: &SECTIONS,
            symbol_count: 4,
        }
    }

    #[test]
    fn generic_targets() {
        let ctx = context(Arch::Generic);
        let fields = InfoFields::new(0, 2, false);

        let info = RelocationInfo::plain(0, fields, true, 3);
        assert_eq!(ctx.resolve_target(&info), Ok((RelocationTarget::Symbol(3), 0)));
        let info = RelocationInfo::plain(0, fields, true, 9);
        assert_eq!(ctx.resolve_target(&info), Ok((RelocationTarget::Undefined, 0)));
        let info = RelocationInfo::plain(0, fields, false, 0);
        assert_eq!(ctx.resolve_target(&info), Ok((RelocationTarget::Absolute, 0)));
        let info = RelocationInfo::plain(0, fields, false, macho::R_NO_TARGET);
        assert_eq!(ctx.resolve_target(&info), Ok((RelocationTarget::Absolute, 0)));
        let info = RelocationInfo::plain(0, fields, false, 2);
        assert_eq!(
            ctx.resolve_target(&info),
            Ok((RelocationTarget::Section(2), -0x10))
        );
        let info = RelocationInfo::plain(0, fields, false, 3);
        assert!(ctx.resolve_target(&info).is_err());

        let info = RelocationInfo::scattered(0, fields, 0x18);
        assert_eq!(
            ctx.resolve_target(&info),
            Ok((RelocationTarget::Section(2), 8))
        );
        let info = RelocationInfo::scattered(0, fields, 0x100);
        assert_eq!(
            ctx.resolve_target(&info),
            Ok((RelocationTarget::Absolute, 0x100))
        );
    }

    #[test]
    fn missing_successor() {
        let ctx = context(Arch::I386);
        let sectdiff = RelocationInfo::scattered(0, InfoFields::new(2, 2, false), 0x10);
        assert!(ctx.decode_all([sectdiff]).is_err());

        let pair = RelocationInfo::scattered(0, InfoFields::new(1, 2, false), 0x4);
        let relocs = ctx.decode_all([sectdiff, pair]).unwrap();
        assert_eq!(relocs.len(), 2);
        assert_eq!(relocs[1].kind, RelocationKind::Generic(GenericReloc::Pair32));
    }

    #[test]
    fn endianness_selection() {
        assert_eq!(
            BitLayout::for_endian(Endianness::Big),
            &BIG_ENDIAN_LAYOUT
        );
        assert_eq!(
            BitLayout::for_endian(Endianness::Little),
            &LITTLE_ENDIAN_LAYOUT
        );
    }
}
