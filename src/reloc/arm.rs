use super::generic::{decode_shared, GenericReloc, TypeCodes};
use super::{check_successor, Howto, InfoFields, Overflow, Relocation, RelocationInfo, RelocationKind, Site};
use crate::macho;

/// Which half of a 32-bit value a `movw` or `movt` instruction holds.
///
/// The discriminant is the length code of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Half {
    /// ARM `movw`, the low 16 bits.
    ArmLower16 = 0,
    /// Thumb `movw`, the low 16 bits.
    ThumbLower16 = 1,
    /// ARM `movt`, the high 16 bits.
    ArmUpper16 = 2,
    /// Thumb `movt`, the high 16 bits.
    ThumbUpper16 = 3,
}

impl Half {
    fn from_length(length: u8) -> Half {
        match length & 3 {
            0 => Half::ArmLower16,
            1 => Half::ThumbLower16,
            2 => Half::ArmUpper16,
            _ => Half::ThumbUpper16,
        }
    }

    /// Return true for `movt`.
    pub fn is_upper(self) -> bool {
        matches!(self, Half::ArmUpper16 | Half::ThumbUpper16)
    }

    /// Return true for Thumb instructions.
    pub fn is_thumb(self) -> bool {
        matches!(self, Half::ThumbLower16 | Half::ThumbUpper16)
    }
}

/// An ARM relocation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmReloc {
    /// A kind shared with the generic backend.
    Generic(GenericReloc),
    /// A 24-bit branch displacement in an ARM `b` or `bl`.
    Br24,
    /// A 22-bit branch displacement in a Thumb `bl` pair.
    ThumbBr22,
    /// One half of an address split across `movw` and `movt`.
    ///
    /// Followed by a PAIR holding the other half.
    Half(Half),
    /// One half of a section difference split across `movw` and `movt`.
    ///
    /// Followed by a PAIR holding the other half.
    HalfSectdiff(Half),
    /// The PAIR that follows `Half` or `HalfSectdiff`.
    ///
    /// The other half of the value has been added to the addend of the
    /// previous relocation.
    HalfPair(Half),
}

static BR24: Howto =
    Howto::new("BR24", 4, 24, 2, true, Overflow::Signed, 0x00ff_ffff);
static THUMB_BR22: Howto =
    Howto::new("BR22", 4, 22, 1, true, Overflow::Signed, 0x07ff_2fff);
static MOVW: Howto = Howto::new("MOVW", 4, 16, 0, false, Overflow::Dont, 0x000f_0fff);
static MOVT: Howto = Howto::new("MOVT", 4, 16, 16, false, Overflow::Dont, 0x000f_0fff);
static THUMB_MOVW: Howto = Howto::new("T_MOVW", 4, 16, 0, false, Overflow::Dont, 0x040f_70ff);
static THUMB_MOVT: Howto = Howto::new("T_MOVT", 4, 16, 16, false, Overflow::Dont, 0x040f_70ff);
static MOVW_SECTDIFF: Howto =
    Howto::new("MOVW_SECTDIFF", 4, 16, 0, false, Overflow::Dont, 0x000f_0fff);
static MOVT_SECTDIFF: Howto =
    Howto::new("MOVT_SECTDIFF", 4, 16, 16, false, Overflow::Dont, 0x000f_0fff);
static THUMB_MOVW_SECTDIFF: Howto =
    Howto::new("T_MOVW_SECTDIFF", 4, 16, 0, false, Overflow::Dont, 0x040f_70ff);
static THUMB_MOVT_SECTDIFF: Howto =
    Howto::new("T_MOVT_SECTDIFF", 4, 16, 16, false, Overflow::Dont, 0x040f_70ff);
static HALF_PAIR: Howto = Howto::new("PAIR_HALF", 4, 16, 0, false, Overflow::Dont, 0).with_masks(0, 0);

static ARM_CODES: TypeCodes = TypeCodes {
    vanilla: macho::ARM_RELOC_VANILLA,
    pair: macho::ARM_RELOC_PAIR,
    sectdiff: macho::ARM_RELOC_SECTDIFF,
    local_sectdiff: macho::ARM_RELOC_LOCAL_SECTDIFF,
};

impl ArmReloc {
    /// The howto entry of this kind.
    pub fn howto(self) -> &'static Howto {
        match self {
            ArmReloc::Generic(kind) => kind.howto(),
            ArmReloc::Br24 => &BR24,
            ArmReloc::ThumbBr22 => &THUMB_BR22,
            ArmReloc::Half(half) => match half {
                Half::ArmLower16 => &MOVW,
                Half::ArmUpper16 => &MOVT,
                Half::ThumbLower16 => &THUMB_MOVW,
                Half::ThumbUpper16 => &THUMB_MOVT,
            },
            ArmReloc::HalfSectdiff(half) => match half {
                Half::ArmLower16 => &MOVW_SECTDIFF,
                Half::ArmUpper16 => &MOVT_SECTDIFF,
                Half::ThumbLower16 => &THUMB_MOVW_SECTDIFF,
                Half::ThumbUpper16 => &THUMB_MOVT_SECTDIFF,
            },
            ArmReloc::HalfPair(_) => &HALF_PAIR,
        }
    }

    /// The record fields that select this kind.
    pub fn to_info_fields(self) -> InfoFields {
        match self {
            ArmReloc::Generic(kind) => kind.info_fields(&ARM_CODES),
            ArmReloc::Br24 => InfoFields::new(macho::ARM_RELOC_BR24, 2, true),
            ArmReloc::ThumbBr22 => InfoFields::new(macho::ARM_THUMB_RELOC_BR22, 2, true),
            ArmReloc::Half(half) => InfoFields::new(macho::ARM_RELOC_HALF, half as u8, false),
            ArmReloc::HalfSectdiff(half) => {
                InfoFields::new(macho::ARM_RELOC_HALF_SECTDIFF, half as u8, false)
            }
            ArmReloc::HalfPair(half) => InfoFields::new(macho::ARM_RELOC_PAIR, half as u8, false),
        }
    }

    /// Return true if this kind must be followed by a PAIR.
    pub fn needs_pair(self) -> bool {
        match self {
            ArmReloc::Generic(kind) => kind.needs_pair(),
            ArmReloc::Half(_) | ArmReloc::HalfSectdiff(_) => true,
            _ => false,
        }
    }

    /// Return true if this kind is a PAIR.
    pub fn is_pair(self) -> bool {
        match self {
            ArmReloc::Generic(kind) => kind.is_pair(),
            ArmReloc::HalfPair(_) => true,
            _ => false,
        }
    }
}

fn previous_half(prev: Option<&Relocation>) -> Option<Half> {
    match prev?.kind {
        RelocationKind::Arm(ArmReloc::Half(half)) | RelocationKind::Arm(ArmReloc::HalfSectdiff(half)) => {
            Some(half)
        }
        _ => None,
    }
}

/// Fold the PAIR of a `movw`/`movt` into the previous relocation.
///
/// The address of the PAIR holds the other 16 bits of the value.
fn fold_half_pair(
    half: Half,
    info: &RelocationInfo,
    site: &mut Site,
    prev: &mut Relocation,
) -> Result<ArmReloc, &'static str> {
    if info.length != half as u8 {
        return Err("Mach-O ARM half PAIR length does not match");
    }
    let other = i64::from(info.address & 0xffff);
    if half.is_upper() {
        prev.addend = prev.addend.wrapping_add(other);
    } else {
        prev.addend = prev.addend.wrapping_add(other << 16);
    }
    site.address = prev.address;
    site.addend = 0;
    Ok(ArmReloc::HalfPair(half))
}

pub(super) fn canonicalize(
    info: &RelocationInfo,
    site: &mut Site,
    mut prev: Option<&mut Relocation>,
) -> Result<ArmReloc, &'static str> {
    if info.r_type == macho::ARM_RELOC_PAIR {
        if let Some(half) = previous_half(prev.as_deref()) {
            let prev = prev.ok_or("Mach-O PAIR relocation has no preceding relocation")?;
            return fold_half_pair(half, info, site, prev);
        }
        if !info.scattered {
            return Err("Mach-O ARM PAIR relocation does not follow a HALF relocation");
        }
    }
    if let Some(kind) = decode_shared(&ARM_CODES, info, site, prev.as_deref_mut())? {
        return Ok(ArmReloc::Generic(kind));
    }
    check_successor(prev.as_deref(), false)?;
    let kind = match (info.scattered, info.r_type) {
        (true, macho::ARM_RELOC_HALF_SECTDIFF) => ArmReloc::HalfSectdiff(Half::from_length(info.length)),
        (false, macho::ARM_RELOC_BR24) if info.length == 2 && info.pcrel => ArmReloc::Br24,
        (false, macho::ARM_THUMB_RELOC_BR22) if info.length == 2 && info.pcrel => ArmReloc::ThumbBr22,
        (_, macho::ARM_RELOC_HALF) if !info.pcrel => ArmReloc::Half(Half::from_length(info.length)),
        _ => return Err("Unsupported Mach-O ARM relocation"),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reloc::{Arch, RelocationContext, RelocationTarget, SectionBounds};

    static SECTIONS: [SectionBounds; 1] = [SectionBounds {
        address: 0,
        size: 0x100,
    }];

    fn context() -> RelocationContext<'static> {
        RelocationContext {
            arch: Arch::Arm,
            sections: &SECTIONS,
            symbol_count: 3,
        }
    }

    #[test]
    fn branches() {
        let ctx = context();
        let info = RelocationInfo::plain(0x10, InfoFields::new(5, 2, true), true, 2);
        let reloc = ctx.decode(info, None).unwrap();
        assert_eq!(reloc.kind, RelocationKind::Arm(ArmReloc::Br24));
        assert_eq!(reloc.target, RelocationTarget::Symbol(2));

        let info = RelocationInfo::plain(0x10, InfoFields::new(6, 2, true), true, 2);
        let reloc = ctx.decode(info, None).unwrap();
        assert_eq!(reloc.kind, RelocationKind::Arm(ArmReloc::ThumbBr22));
        assert_eq!(reloc.kind.to_info_fields(), InfoFields::new(6, 2, true));

        let info = RelocationInfo::plain(0x10, InfoFields::new(5, 2, false), true, 2);
        assert!(ctx.decode(info, None).is_err());
    }

    #[test]
    fn movw_movt_pairs() {
        let ctx = context();
        // movt of _sym+0x12345678: the PAIR carries the low half.
        let movt = RelocationInfo::plain(0x20, InfoFields::new(8, 2, false), true, 1);
        let pair = RelocationInfo::plain(0x5678, InfoFields::new(1, 2, false), false, 0xff_ffff);
        let relocs = ctx.decode_all([movt, pair]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Arm(ArmReloc::Half(Half::ArmUpper16)));
        assert_eq!(relocs[0].addend, 0x5678);
        assert_eq!(relocs[1].kind, RelocationKind::Arm(ArmReloc::HalfPair(Half::ArmUpper16)));
        assert_eq!(relocs[1].address, 0x20);
        assert_eq!(relocs[1].info.address, 0x5678);

        // Thumb movw: the PAIR carries the high half.
        let movw = RelocationInfo::plain(0x24, InfoFields::new(8, 1, false), true, 1);
        let pair = RelocationInfo::plain(0x1234, InfoFields::new(1, 1, false), false, 0xff_ffff);
        let relocs = ctx.decode_all([movw, pair]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Arm(ArmReloc::Half(Half::ThumbLower16)));
        assert_eq!(relocs[0].addend, 0x1234_0000);
        assert_eq!(relocs[0].howto().name, "T_MOVW");
    }

    #[test]
    fn half_without_pair_fails() {
        let ctx = context();
        let movt = RelocationInfo::plain(0x20, InfoFields::new(8, 2, false), true, 1);
        assert!(ctx.decode_all([movt]).is_err());
        let br = RelocationInfo::plain(0x24, InfoFields::new(5, 2, true), true, 1);
        assert!(ctx.decode_all([movt, br]).is_err());
    }

    #[test]
    fn plain_pair_without_half_fails() {
        let ctx = context();
        let pair = RelocationInfo::plain(0x20, InfoFields::new(1, 2, false), false, 0);
        assert!(ctx.decode_all([pair]).is_err());
    }

    #[test]
    fn half_sectdiff() {
        let ctx = context();
        let movw = RelocationInfo::scattered(0x30, InfoFields::new(9, 0, false), 0x40);
        let pair = RelocationInfo::scattered(0x0001, InfoFields::new(1, 0, false), 0x10);
        let relocs = ctx.decode_all([movw, pair]).unwrap();
        assert_eq!(
            relocs[0].kind,
            RelocationKind::Arm(ArmReloc::HalfSectdiff(Half::ArmLower16))
        );
        assert_eq!(relocs[0].target, RelocationTarget::Section(1));
        assert_eq!(relocs[0].addend, 0x40 + 0x1_0000);
        assert_eq!(relocs[1].address, 0x30);
    }

    #[test]
    fn scattered_half() {
        let ctx = context();
        // movt of a local address: the target is the section holding 0x48.
        let movt = RelocationInfo::scattered(0x34, InfoFields::new(8, 2, false), 0x48);
        let pair = RelocationInfo::scattered(0x0048, InfoFields::new(1, 2, false), 0);
        let relocs = ctx.decode_all([movt, pair]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Arm(ArmReloc::Half(Half::ArmUpper16)));
        assert_eq!(relocs[0].target, RelocationTarget::Section(1));
        assert_eq!(relocs[0].addend, 0x48 + 0x48);
        assert_eq!(relocs[1].kind, RelocationKind::Arm(ArmReloc::HalfPair(Half::ArmUpper16)));
        assert_eq!(relocs[1].address, 0x34);

        let movt = RelocationInfo::scattered(0x34, InfoFields::new(8, 2, false), 0x48);
        assert!(ctx.decode_all([movt]).is_err());
    }

    #[test]
    fn shared_kinds_use_arm_numbers() {
        assert_eq!(
            ArmReloc::Generic(GenericReloc::LocalSectdiff32).to_info_fields(),
            InfoFields::new(macho::ARM_RELOC_LOCAL_SECTDIFF, 2, false)
        );
        let ctx = context();
        let sectdiff = RelocationInfo::scattered(0x8, InfoFields::new(2, 2, false), 0x24);
        let pair = RelocationInfo::scattered(0, InfoFields::new(1, 2, false), 0x4);
        let relocs = ctx.decode_all([sectdiff, pair]).unwrap();
        assert_eq!(
            relocs[0].kind,
            RelocationKind::Arm(ArmReloc::Generic(GenericReloc::Sectdiff32))
        );
        assert_eq!(
            relocs[1].kind,
            RelocationKind::Arm(ArmReloc::Generic(GenericReloc::Pair32))
        );
    }
}
