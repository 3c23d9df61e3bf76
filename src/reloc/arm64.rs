use super::{Howto, InfoFields, Overflow, Relocation, RelocationInfo, RelocationKind, Site};
use crate::macho;

/// An ARM64 relocation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm64Reloc {
    /// An 8-bit absolute value.
    Unsigned8,
    /// A 16-bit absolute value.
    Unsigned16,
    /// A 32-bit absolute value.
    Unsigned32,
    /// A 64-bit absolute value.
    Unsigned64,
    /// The subtrahend of a 32-bit difference.
    ///
    /// Followed by an `Unsigned32` at the same address.
    Subtractor32,
    /// The subtrahend of a 64-bit difference.
    ///
    /// Followed by an `Unsigned64` at the same address.
    Subtractor64,
    /// A 26-bit branch displacement in a `b` or `bl`.
    Branch26,
    /// The page of the target in an `adrp`.
    Page21,
    /// The offset of the target within its page.
    PageOff12,
    /// The page of the GOT entry of the target in an `adrp`.
    GotLoadPage21,
    /// The offset of the GOT entry of the target within its page.
    GotLoadPageOff12,
    /// A pc-relative reference to the GOT entry of the target.
    PointerToGot,
    /// The page of the TLV descriptor of the target in an `adrp`.
    TlvpLoadPage21,
    /// The offset of the TLV descriptor of the target within its page.
    TlvpLoadPageOff12,
    /// An explicit addend for the following relocation.
    ///
    /// The addend has also been added to the following relocation.
    Addend,
}

static UNSIGNED8: Howto = Howto::new("8", 1, 8, 0, false, Overflow::Bitfield, 0xff);
static UNSIGNED16: Howto = Howto::new("16", 2, 16, 0, false, Overflow::Bitfield, 0xffff);
static UNSIGNED32: Howto = Howto::new("32", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);
static UNSIGNED64: Howto = Howto::new("64", 8, 64, 0, false, Overflow::Dont, u64::MAX);
static SUBTRACTOR32: Howto =
    Howto::new("SUBTRACTOR32", 4, 32, 0, false, Overflow::Dont, 0xffff_ffff);
static SUBTRACTOR64: Howto = Howto::new("SUBTRACTOR64", 8, 64, 0, false, Overflow::Dont, u64::MAX);
static BRANCH26: Howto = Howto::new("BRANCH26", 4, 26, 2, true, Overflow::Signed, 0x03ff_ffff);
static PAGE21: Howto = Howto::new("PAGE21", 4, 21, 12, true, Overflow::Signed, 0x601f_ffe0);
static PAGEOFF12: Howto = Howto::new("PGOFF12", 4, 12, 0, false, Overflow::Dont, 0x003f_fc00);
static GOT_LOAD_PAGE21: Howto =
    Howto::new("GOT_LD_PG21", 4, 21, 12, true, Overflow::Signed, 0x601f_ffe0);
static GOT_LOAD_PAGEOFF12: Howto =
    Howto::new("GOT_LD_PGOFF12", 4, 12, 0, false, Overflow::Dont, 0x003f_fc00);
static POINTER_TO_GOT: Howto =
    Howto::new("PTR_TO_GOT", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static TLVP_LOAD_PAGE21: Howto =
    Howto::new("TLVP_LD_PG21", 4, 21, 12, true, Overflow::Signed, 0x601f_ffe0);
static TLVP_LOAD_PAGEOFF12: Howto =
    Howto::new("TLVP_LD_PGOFF12", 4, 12, 0, false, Overflow::Dont, 0x003f_fc00);
static ADDEND: Howto = Howto::new("ADDEND", 4, 32, 0, false, Overflow::Dont, 0).with_masks(0, 0);

impl Arm64Reloc {
    /// The howto entry of this kind.
    pub fn howto(self) -> &'static Howto {
        match self {
            Arm64Reloc::Unsigned8 => &UNSIGNED8,
            Arm64Reloc::Unsigned16 => &UNSIGNED16,
            Arm64Reloc::Unsigned32 => &UNSIGNED32,
            Arm64Reloc::Unsigned64 => &UNSIGNED64,
            Arm64Reloc::Subtractor32 => &SUBTRACTOR32,
            Arm64Reloc::Subtractor64 => &SUBTRACTOR64,
            Arm64Reloc::Branch26 => &BRANCH26,
            Arm64Reloc::Page21 => &PAGE21,
            Arm64Reloc::PageOff12 => &PAGEOFF12,
            Arm64Reloc::GotLoadPage21 => &GOT_LOAD_PAGE21,
            Arm64Reloc::GotLoadPageOff12 => &GOT_LOAD_PAGEOFF12,
            Arm64Reloc::PointerToGot => &POINTER_TO_GOT,
            Arm64Reloc::TlvpLoadPage21 => &TLVP_LOAD_PAGE21,
            Arm64Reloc::TlvpLoadPageOff12 => &TLVP_LOAD_PAGEOFF12,
            Arm64Reloc::Addend => &ADDEND,
        }
    }

    /// The record fields that select this kind.
    pub fn to_info_fields(self) -> InfoFields {
        let (r_type, length, pcrel) = match self {
            Arm64Reloc::Unsigned8 => (macho::ARM64_RELOC_UNSIGNED, 0, false),
            Arm64Reloc::Unsigned16 => (macho::ARM64_RELOC_UNSIGNED, 1, false),
            Arm64Reloc::Unsigned32 => (macho::ARM64_RELOC_UNSIGNED, 2, false),
            Arm64Reloc::Unsigned64 => (macho::ARM64_RELOC_UNSIGNED, 3, false),
            Arm64Reloc::Subtractor32 => (macho::ARM64_RELOC_SUBTRACTOR, 2, false),
            Arm64Reloc::Subtractor64 => (macho::ARM64_RELOC_SUBTRACTOR, 3, false),
            Arm64Reloc::Branch26 => (macho::ARM64_RELOC_BRANCH26, 2, true),
            Arm64Reloc::Page21 => (macho::ARM64_RELOC_PAGE21, 2, true),
            Arm64Reloc::PageOff12 => (macho::ARM64_RELOC_PAGEOFF12, 2, false),
            Arm64Reloc::GotLoadPage21 => (macho::ARM64_RELOC_GOT_LOAD_PAGE21, 2, true),
            Arm64Reloc::GotLoadPageOff12 => (macho::ARM64_RELOC_GOT_LOAD_PAGEOFF12, 2, false),
            Arm64Reloc::PointerToGot => (macho::ARM64_RELOC_POINTER_TO_GOT, 2, true),
            Arm64Reloc::TlvpLoadPage21 => (macho::ARM64_RELOC_TLVP_LOAD_PAGE21, 2, true),
            Arm64Reloc::TlvpLoadPageOff12 => (macho::ARM64_RELOC_TLVP_LOAD_PAGEOFF12, 2, false),
            Arm64Reloc::Addend => (macho::ARM64_RELOC_ADDEND, 2, false),
        };
        InfoFields::new(r_type, length, pcrel)
    }

    /// Return true if this kind must be followed by a companion record.
    pub fn needs_successor(self) -> bool {
        matches!(
            self,
            Arm64Reloc::Subtractor32 | Arm64Reloc::Subtractor64 | Arm64Reloc::Addend
        )
    }
}

pub(super) fn is_addend(info: &RelocationInfo) -> bool {
    !info.scattered && info.r_type == macho::ARM64_RELOC_ADDEND
}

/// The signed 24-bit addend held in the symbol number field.
pub(super) fn addend_value(info: &RelocationInfo) -> i64 {
    i64::from(((info.symbolnum << 8) as i32) >> 8)
}

pub(super) fn canonicalize(
    info: &RelocationInfo,
    site: &mut Site,
    prev: Option<&mut Relocation>,
) -> Result<Arm64Reloc, &'static str> {
    if info.scattered {
        return Err("Mach-O ARM64 relocations cannot be scattered");
    }
    let kind = match (info.r_type, info.length, info.pcrel) {
        (macho::ARM64_RELOC_UNSIGNED, 0, false) => Arm64Reloc::Unsigned8,
        (macho::ARM64_RELOC_UNSIGNED, 1, false) => Arm64Reloc::Unsigned16,
        (macho::ARM64_RELOC_UNSIGNED, 2, false) => Arm64Reloc::Unsigned32,
        (macho::ARM64_RELOC_UNSIGNED, 3, false) => Arm64Reloc::Unsigned64,
        (macho::ARM64_RELOC_SUBTRACTOR, 2, false) => Arm64Reloc::Subtractor32,
        (macho::ARM64_RELOC_SUBTRACTOR, 3, false) => Arm64Reloc::Subtractor64,
        (macho::ARM64_RELOC_BRANCH26, 2, true) => Arm64Reloc::Branch26,
        (macho::ARM64_RELOC_PAGE21, 2, true) => Arm64Reloc::Page21,
        (macho::ARM64_RELOC_PAGEOFF12, 2, false) => Arm64Reloc::PageOff12,
        (macho::ARM64_RELOC_GOT_LOAD_PAGE21, 2, true) => Arm64Reloc::GotLoadPage21,
        (macho::ARM64_RELOC_GOT_LOAD_PAGEOFF12, 2, false) => Arm64Reloc::GotLoadPageOff12,
        (macho::ARM64_RELOC_POINTER_TO_GOT, 2, true) => Arm64Reloc::PointerToGot,
        (macho::ARM64_RELOC_TLVP_LOAD_PAGE21, 2, true) => Arm64Reloc::TlvpLoadPage21,
        (macho::ARM64_RELOC_TLVP_LOAD_PAGEOFF12, 2, false) => Arm64Reloc::TlvpLoadPageOff12,
        (macho::ARM64_RELOC_ADDEND, 2, false) => Arm64Reloc::Addend,
        _ => return Err("Unsupported Mach-O ARM64 relocation"),
    };
    match prev.map(|prev| (prev.kind, prev.address, prev.addend)) {
        Some((RelocationKind::Arm64(Arm64Reloc::Subtractor32), address, _)) => {
            if kind != Arm64Reloc::Unsigned32 || address != site.address {
                return Err("Mach-O SUBTRACTOR relocation is not followed by UNSIGNED");
            }
        }
        Some((RelocationKind::Arm64(Arm64Reloc::Subtractor64), address, _)) => {
            if kind != Arm64Reloc::Unsigned64 || address != site.address {
                return Err("Mach-O SUBTRACTOR relocation is not followed by UNSIGNED");
            }
        }
        Some((RelocationKind::Arm64(Arm64Reloc::Addend), address, addend)) => {
            if !matches!(
                kind,
                Arm64Reloc::Branch26 | Arm64Reloc::Page21 | Arm64Reloc::PageOff12
            ) || address != site.address
            {
                return Err("Mach-O ADDEND relocation is not followed by a page or branch relocation");
            }
            site.addend = site.addend.wrapping_add(addend);
        }
        _ => {}
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reloc::{Arch, RelocationContext, RelocationTarget, SectionBounds};

    fn context() -> RelocationContext<'static> {
        static SECTIONS: [SectionBounds; 1] = [SectionBounds {
            address: 0,
            size: 0x100,
        }];
        RelocationContext {
            arch: Arch::Arm64,
            sections: &SECTIONS,
            symbol_count: 4,
        }
    }

    #[test]
    fn unsigned_lengths() {
        let ctx = context();
        for (length, kind) in [
            (0, Arm64Reloc::Unsigned8),
            (1, Arm64Reloc::Unsigned16),
            (2, Arm64Reloc::Unsigned32),
            (3, Arm64Reloc::Unsigned64),
        ] {
            let info = RelocationInfo::plain(0, InfoFields::new(0, length, false), true, 0);
            assert_eq!(
                ctx.decode(info, None).unwrap().kind,
                RelocationKind::Arm64(kind)
            );
        }
        let info = RelocationInfo::plain(0, InfoFields::new(0, 3, true), true, 0);
        assert!(ctx.decode(info, None).is_err());
    }

    #[test]
    fn addend_folds_into_page() {
        let ctx = context();
        // ADDEND -8 followed by PAGE21 of symbol 2.
        let addend = RelocationInfo::plain(0x10, InfoFields::new(10, 2, false), false, 0xff_fff8);
        let page = RelocationInfo::plain(0x10, InfoFields::new(3, 2, true), true, 2);
        let relocs = ctx.decode_all([addend, page]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Arm64(Arm64Reloc::Addend));
        assert_eq!(relocs[0].target, RelocationTarget::Absolute);
        assert_eq!(relocs[0].addend, -8);
        assert_eq!(relocs[1].kind, RelocationKind::Arm64(Arm64Reloc::Page21));
        assert_eq!(relocs[1].target, RelocationTarget::Symbol(2));
        assert_eq!(relocs[1].addend, -8);

        let unsigned = RelocationInfo::plain(0x10, InfoFields::new(0, 3, false), true, 2);
        assert!(ctx.decode_all([addend, unsigned]).is_err());
        assert!(ctx.decode_all([addend]).is_err());
    }

    #[test]
    fn subtractor_pairs() {
        let ctx = context();
        let sub = RelocationInfo::plain(0x20, InfoFields::new(1, 3, false), true, 1);
        let unsigned = RelocationInfo::plain(0x20, InfoFields::new(0, 3, false), true, 2);
        let relocs = ctx.decode_all([sub, unsigned]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::Arm64(Arm64Reloc::Subtractor64));
        assert_eq!(relocs[1].kind, RelocationKind::Arm64(Arm64Reloc::Unsigned64));

        let narrow = RelocationInfo::plain(0x20, InfoFields::new(0, 2, false), true, 2);
        assert!(ctx.decode_all([sub, narrow]).is_err());
        let elsewhere = RelocationInfo::plain(0x28, InfoFields::new(0, 3, false), true, 2);
        assert!(ctx.decode_all([sub, elsewhere]).is_err());
    }

    #[test]
    fn scattered_rejected() {
        let info = RelocationInfo::scattered(0, InfoFields::new(0, 2, false), 0);
        assert!(context().decode(info, None).is_err());
    }

    #[test]
    fn info_fields_round_trip() {
        for kind in [
            Arm64Reloc::Branch26,
            Arm64Reloc::PageOff12,
            Arm64Reloc::GotLoadPage21,
            Arm64Reloc::TlvpLoadPageOff12,
            Arm64Reloc::PointerToGot,
        ] {
            let fields = kind.to_info_fields();
            let info = RelocationInfo::plain(0, fields, true, 0);
            assert_eq!(
                context().decode(info, None).unwrap().kind,
                RelocationKind::Arm64(kind)
            );
        }
    }
}
