use super::{check_successor, Arch, Howto, InfoFields, Overflow, Relocation, RelocationInfo, Site};
use crate::macho;

/// A relocation kind shared by the generic, i386 and ARM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericReloc {
    /// An 8-bit absolute value.
    Vanilla8,
    /// A 16-bit absolute value.
    Vanilla16,
    /// A 32-bit absolute value.
    Vanilla32,
    /// A 16-bit pc-relative displacement.
    Disp16,
    /// A 32-bit pc-relative displacement.
    Disp32,
    /// The first half of a 32-bit section difference.
    Sectdiff32,
    /// The first half of a 16-bit section difference.
    Sectdiff16,
    /// The first half of a 32-bit section difference to a local symbol.
    LocalSectdiff32,
    /// The first half of a 16-bit section difference to a local symbol.
    LocalSectdiff16,
    /// The second half of a 32-bit section difference.
    Pair32,
    /// The second half of a 16-bit section difference.
    Pair16,
    /// A thread local variable reference.
    Tlv,
}

static VANILLA8: Howto = Howto::new("8", 1, 8, 0, false, Overflow::Bitfield, 0xff);
static VANILLA16: Howto = Howto::new("16", 2, 16, 0, false, Overflow::Bitfield, 0xffff);
static VANILLA32: Howto = Howto::new("32", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);
static DISP16: Howto = Howto::new("DISP16", 2, 16, 0, true, Overflow::Signed, 0xffff);
static DISP32: Howto = Howto::new("DISP32", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static SECTDIFF32: Howto =
    Howto::new("SECTDIFF_32", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);
static SECTDIFF16: Howto = Howto::new("SECTDIFF_16", 2, 16, 0, false, Overflow::Bitfield, 0xffff);
static LOCAL_SECTDIFF32: Howto =
    Howto::new("LSECTDIFF_32", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);
static LOCAL_SECTDIFF16: Howto =
    Howto::new("LSECTDIFF_16", 2, 16, 0, false, Overflow::Bitfield, 0xffff);
static PAIR32: Howto = Howto::new("PAIR_32", 4, 32, 0, false, Overflow::Dont, 0xffff_ffff);
static PAIR16: Howto = Howto::new("PAIR_16", 2, 16, 0, false, Overflow::Dont, 0xffff);
static TLV: Howto = Howto::new("TLV", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);

impl GenericReloc {
    /// The howto entry of this kind.
    pub fn howto(self) -> &'static Howto {
        match self {
            GenericReloc::Vanilla8 => &VANILLA8,
            GenericReloc::Vanilla16 => &VANILLA16,
            GenericReloc::Vanilla32 => &VANILLA32,
            GenericReloc::Disp16 => &DISP16,
            GenericReloc::Disp32 => &DISP32,
            GenericReloc::Sectdiff32 => &SECTDIFF32,
            GenericReloc::Sectdiff16 => &SECTDIFF16,
            GenericReloc::LocalSectdiff32 => &LOCAL_SECTDIFF32,
            GenericReloc::LocalSectdiff16 => &LOCAL_SECTDIFF16,
            GenericReloc::Pair32 => &PAIR32,
            GenericReloc::Pair16 => &PAIR16,
            GenericReloc::Tlv => &TLV,
        }
    }

    /// The record fields that select this kind, using the generic type numbers.
    pub fn to_info_fields(self) -> InfoFields {
        self.info_fields(&GENERIC_CODES)
    }

    pub(super) fn info_fields(self, codes: &TypeCodes) -> InfoFields {
        let (r_type, length, pcrel) = match self {
            GenericReloc::Vanilla8 => (codes.vanilla, 0, false),
            GenericReloc::Vanilla16 => (codes.vanilla, 1, false),
            GenericReloc::Vanilla32 => (codes.vanilla, 2, false),
            GenericReloc::Disp16 => (codes.vanilla, 1, true),
            GenericReloc::Disp32 => (codes.vanilla, 2, true),
            GenericReloc::Sectdiff32 => (codes.sectdiff, 2, false),
            GenericReloc::Sectdiff16 => (codes.sectdiff, 1, false),
            GenericReloc::LocalSectdiff32 => (codes.local_sectdiff, 2, false),
            GenericReloc::LocalSectdiff16 => (codes.local_sectdiff, 1, false),
            GenericReloc::Pair32 => (codes.pair, 2, false),
            GenericReloc::Pair16 => (codes.pair, 1, false),
            GenericReloc::Tlv => (macho::GENERIC_RELOC_TLV, 2, false),
        };
        InfoFields::new(r_type, length, pcrel)
    }

    /// Return true if this kind must be followed by a PAIR.
    pub fn needs_pair(self) -> bool {
        matches!(
            self,
            GenericReloc::Sectdiff32
                | GenericReloc::Sectdiff16
                | GenericReloc::LocalSectdiff32
                | GenericReloc::LocalSectdiff16
        )
    }

    /// Return true if this kind is a PAIR.
    pub fn is_pair(self) -> bool {
        matches!(self, GenericReloc::Pair32 | GenericReloc::Pair16)
    }
}

/// The type numbers of the shared kinds for one backend.
#[derive(Debug)]
pub(super) struct TypeCodes {
    pub vanilla: u8,
    pub pair: u8,
    pub sectdiff: u8,
    pub local_sectdiff: u8,
}

pub(super) static GENERIC_CODES: TypeCodes = TypeCodes {
    vanilla: macho::GENERIC_RELOC_VANILLA,
    pair: macho::GENERIC_RELOC_PAIR,
    sectdiff: macho::GENERIC_RELOC_SECTDIFF,
    local_sectdiff: macho::GENERIC_RELOC_LOCAL_SECTDIFF,
};

/// Decode the kinds that are common to the 32-bit backends.
///
/// Returns `Ok(None)` if the record type is not one of the shared types.
pub(super) fn decode_shared(
    codes: &TypeCodes,
    info: &RelocationInfo,
    site: &mut Site,
    prev: Option<&mut Relocation>,
) -> Result<Option<GenericReloc>, &'static str> {
    let r_type = info.r_type;
    if r_type == codes.vanilla {
        check_successor(prev.as_deref(), false)?;
        let kind = match info.length_pcrel() {
            0 => GenericReloc::Vanilla8,
            2 => GenericReloc::Vanilla16,
            3 => GenericReloc::Disp16,
            4 => GenericReloc::Vanilla32,
            5 => GenericReloc::Disp32,
            _ => return Err("Unsupported Mach-O VANILLA relocation length"),
        };
        return Ok(Some(kind));
    }
    if !info.scattered {
        return Ok(None);
    }
    if r_type == codes.pair {
        let prev = prev.ok_or("Mach-O PAIR relocation has no preceding relocation")?;
        let kind = match info.length {
            2 => GenericReloc::Pair32,
            1 => GenericReloc::Pair16,
            _ => return Err("Unsupported Mach-O PAIR relocation length"),
        };
        site.address = prev.address;
        return Ok(Some(kind));
    }
    let (kind32, kind16) = if r_type == codes.sectdiff {
        (GenericReloc::Sectdiff32, GenericReloc::Sectdiff16)
    } else if r_type == codes.local_sectdiff {
        (GenericReloc::LocalSectdiff32, GenericReloc::LocalSectdiff16)
    } else {
        return Ok(None);
    };
    check_successor(prev.as_deref(), false)?;
    match info.length {
        2 => Ok(Some(kind32)),
        1 => Ok(Some(kind16)),
        _ => Err("Unsupported Mach-O SECTDIFF relocation length"),
    }
}

pub(super) fn canonicalize(
    arch: Arch,
    info: &RelocationInfo,
    site: &mut Site,
    mut prev: Option<&mut Relocation>,
) -> Result<GenericReloc, &'static str> {
    if let Some(kind) = decode_shared(&GENERIC_CODES, info, site, prev.as_deref_mut())? {
        return Ok(kind);
    }
    if arch == Arch::I386
        && !info.scattered
        && info.r_type == macho::GENERIC_RELOC_TLV
        && info.length == 2
        && !info.pcrel
    {
        check_successor(prev.as_deref(), false)?;
        return Ok(GenericReloc::Tlv);
    }
    Err("Unsupported Mach-O generic relocation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reloc::{RelocationContext, RelocationKind, RelocationTarget, SectionBounds};

    static SECTIONS: [SectionBounds; 2] = [
        SectionBounds {
            address: 0,
            size: 0x20,
        },
        SectionBounds {
            address: 0x20,
            size: 0x10,
        },
    ];

    fn context(arch: Arch) -> RelocationContext<'static> {
        RelocationContext {
            arch,
            sections: &SECTIONS,
            symbol_count: 2,
        }
    }

    #[test]
    fn vanilla() {
        let ctx = context(Arch::I386);
        let cases = [
            (0, false, Some(GenericReloc::Vanilla8)),
            (0, true, None),
            (1, false, Some(GenericReloc::Vanilla16)),
            (1, true, Some(GenericReloc::Disp16)),
            (2, false, Some(GenericReloc::Vanilla32)),
            (2, true, Some(GenericReloc::Disp32)),
            (3, false, None),
        ];
        for (length, pcrel, expect) in cases {
            let info = RelocationInfo::plain(4, InfoFields::new(0, length, pcrel), true, 1);
            let reloc = ctx.decode(info, None);
            match expect {
                Some(kind) => {
                    let reloc = reloc.unwrap();
                    assert_eq!(reloc.kind, RelocationKind::Generic(kind));
                    assert_eq!(reloc.target, RelocationTarget::Symbol(1));
                    assert_eq!(kind.to_info_fields(), InfoFields::new(0, length, pcrel));
                }
                None => assert!(reloc.is_err()),
            }
        }
    }

    #[test]
    fn sectdiff_pair() {
        let ctx = context(Arch::I386);
        let sectdiff = RelocationInfo::scattered(0x8, InfoFields::new(2, 2, false), 0x24);
        let pair = RelocationInfo::scattered(0, InfoFields::new(1, 2, false), 0x4);
        let relocs = ctx.decode_all([sectdiff, pair]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Generic(GenericReloc::Sectdiff32));
        assert_eq!(relocs[0].target, RelocationTarget::Section(2));
        assert_eq!(relocs[0].addend, 4);
        assert_eq!(relocs[1].kind, RelocationKind::Generic(GenericReloc::Pair32));
        assert_eq!(relocs[1].address, 0x8);
        assert_eq!(relocs[1].target, RelocationTarget::Section(1));
        assert_eq!(relocs[1].addend, 4);
        assert_eq!(relocs[1].howto().name, "PAIR_32");

        let sectdiff16 = RelocationInfo::scattered(0x8, InfoFields::new(4, 1, false), 0x24);
        let pair16 = RelocationInfo::scattered(0, InfoFields::new(1, 1, false), 0x4);
        let relocs = ctx.decode_all([sectdiff16, pair16]).unwrap();
        assert_eq!(
            relocs[0].kind,
            RelocationKind::Generic(GenericReloc::LocalSectdiff16)
        );
        assert_eq!(relocs[1].kind, RelocationKind::Generic(GenericReloc::Pair16));
    }

    #[test]
    fn pair_first_fails() {
        let ctx = context(Arch::Generic);
        let pair = RelocationInfo::scattered(0, InfoFields::new(1, 2, false), 0x4);
        assert!(ctx.decode_all([pair]).is_err());
    }

    #[test]
    fn sectdiff_without_pair_fails() {
        let ctx = context(Arch::Generic);
        let sectdiff = RelocationInfo::scattered(0x8, InfoFields::new(2, 2, false), 0x24);
        let vanilla = RelocationInfo::plain(0xc, InfoFields::new(0, 2, false), true, 0);
        assert!(ctx.decode_all([sectdiff, vanilla]).is_err());
    }

    #[test]
    fn tlv() {
        let info = RelocationInfo::plain(0, InfoFields::new(5, 2, false), true, 0);
        let reloc = context(Arch::I386).decode(info, None).unwrap();
        assert_eq!(reloc.kind, RelocationKind::Generic(GenericReloc::Tlv));
        assert!(context(Arch::Generic).decode(info, None).is_err());
    }
}
