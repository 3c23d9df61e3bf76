use super::{Howto, InfoFields, Overflow, Relocation, RelocationInfo, RelocationKind, Site};
use crate::macho;

/// An x86-64 relocation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum X86_64Reloc {
    /// A 32-bit absolute value.
    Unsigned32,
    /// A 64-bit absolute value.
    Unsigned64,
    /// A 32-bit pc-relative displacement.
    Signed,
    /// A 32-bit pc-relative displacement followed by a 1 byte immediate.
    Signed1,
    /// A 32-bit pc-relative displacement followed by a 2 byte immediate.
    Signed2,
    /// A 32-bit pc-relative displacement followed by a 4 byte immediate.
    Signed4,
    /// A 32-bit branch displacement.
    Branch32,
    /// An 8-bit branch displacement.
    Branch8,
    /// A `movq` load of a GOT entry.
    GotLoad,
    /// Some other pc-relative reference to a GOT entry.
    Got,
    /// The subtrahend of a 32-bit difference.
    ///
    /// Followed by an `Unsigned32` at the same address.
    Subtractor32,
    /// The subtrahend of a 64-bit difference.
    ///
    /// Followed by an `Unsigned64` at the same address.
    Subtractor64,
    /// A thread local variable reference.
    Tlv,
}

static UNSIGNED32: Howto = Howto::new("32", 4, 32, 0, false, Overflow::Bitfield, 0xffff_ffff);
static UNSIGNED64: Howto = Howto::new("64", 8, 64, 0, false, Overflow::Bitfield, u64::MAX);
static SIGNED: Howto = Howto::new("DISP32", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static SIGNED1: Howto = Howto::new("DISP32_1", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static SIGNED2: Howto = Howto::new("DISP32_2", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static SIGNED4: Howto = Howto::new("DISP32_4", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static BRANCH32: Howto = Howto::new("BRANCH32", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static BRANCH8: Howto = Howto::new("BRANCH8", 1, 8, 0, true, Overflow::Signed, 0xff);
static GOT_LOAD: Howto = Howto::new("GOT_LOAD", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static GOT: Howto = Howto::new("GOT", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);
static SUBTRACTOR32: Howto =
    Howto::new("SUBTRACTOR32", 4, 32, 0, false, Overflow::Dont, 0xffff_ffff);
static SUBTRACTOR64: Howto = Howto::new("SUBTRACTOR64", 8, 64, 0, false, Overflow::Dont, u64::MAX);
static TLV: Howto = Howto::new("TLV", 4, 32, 0, true, Overflow::Signed, 0xffff_ffff);

impl X86_64Reloc {
    /// The howto entry of this kind.
    pub fn howto(self) -> &'static Howto {
        match self {
            X86_64Reloc::Unsigned32 => &UNSIGNED32,
            X86_64Reloc::Unsigned64 => &UNSIGNED64,
            X86_64Reloc::Signed => &SIGNED,
            X86_64Reloc::Signed1 => &SIGNED1,
            X86_64Reloc::Signed2 => &SIGNED2,
            X86_64Reloc::Signed4 => &SIGNED4,
            X86_64Reloc::Branch32 => &BRANCH32,
            X86_64Reloc::Branch8 => &BRANCH8,
            X86_64Reloc::GotLoad => &GOT_LOAD,
            X86_64Reloc::Got => &GOT,
            X86_64Reloc::Subtractor32 => &SUBTRACTOR32,
            X86_64Reloc::Subtractor64 => &SUBTRACTOR64,
            X86_64Reloc::Tlv => &TLV,
        }
    }

    /// The record fields that select this kind.
    pub fn to_info_fields(self) -> InfoFields {
        let (r_type, length, pcrel) = match self {
            X86_64Reloc::Unsigned32 => (macho::X86_64_RELOC_UNSIGNED, 2, false),
            X86_64Reloc::Unsigned64 => (macho::X86_64_RELOC_UNSIGNED, 3, false),
            X86_64Reloc::Signed => (macho::X86_64_RELOC_SIGNED, 2, true),
            X86_64Reloc::Signed1 => (macho::X86_64_RELOC_SIGNED_1, 2, true),
            X86_64Reloc::Signed2 => (macho::X86_64_RELOC_SIGNED_2, 2, true),
            X86_64Reloc::Signed4 => (macho::X86_64_RELOC_SIGNED_4, 2, true),
            X86_64Reloc::Branch32 => (macho::X86_64_RELOC_BRANCH, 2, true),
            X86_64Reloc::Branch8 => (macho::X86_64_RELOC_BRANCH, 0, true),
            X86_64Reloc::GotLoad => (macho::X86_64_RELOC_GOT_LOAD, 2, true),
            X86_64Reloc::Got => (macho::X86_64_RELOC_GOT, 2, true),
            X86_64Reloc::Subtractor32 => (macho::X86_64_RELOC_SUBTRACTOR, 2, false),
            X86_64Reloc::Subtractor64 => (macho::X86_64_RELOC_SUBTRACTOR, 3, false),
            X86_64Reloc::Tlv => (macho::X86_64_RELOC_TLV, 2, true),
        };
        InfoFields::new(r_type, length, pcrel)
    }

    /// Return true if this kind must be followed by a companion record.
    pub fn needs_successor(self) -> bool {
        matches!(self, X86_64Reloc::Subtractor32 | X86_64Reloc::Subtractor64)
    }
}

pub(super) fn canonicalize(
    info: &RelocationInfo,
    site: &mut Site,
    prev: Option<&mut Relocation>,
) -> Result<X86_64Reloc, &'static str> {
    if info.scattered {
        return Err("Mach-O x86-64 relocations cannot be scattered");
    }
    let kind = match (info.r_type, info.length, info.pcrel) {
        (macho::X86_64_RELOC_UNSIGNED, 2, false) => X86_64Reloc::Unsigned32,
        (macho::X86_64_RELOC_UNSIGNED, 3, false) => X86_64Reloc::Unsigned64,
        (macho::X86_64_RELOC_SIGNED, 2, true) => X86_64Reloc::Signed,
        (macho::X86_64_RELOC_SIGNED_1, 2, true) => X86_64Reloc::Signed1,
        (macho::X86_64_RELOC_SIGNED_2, 2, true) => X86_64Reloc::Signed2,
        (macho::X86_64_RELOC_SIGNED_4, 2, true) => X86_64Reloc::Signed4,
        (macho::X86_64_RELOC_BRANCH, 2, true) => X86_64Reloc::Branch32,
        (macho::X86_64_RELOC_BRANCH, 0, true) => X86_64Reloc::Branch8,
        (macho::X86_64_RELOC_GOT_LOAD, 2, true) => X86_64Reloc::GotLoad,
        (macho::X86_64_RELOC_GOT, 2, true) => X86_64Reloc::Got,
        (macho::X86_64_RELOC_SUBTRACTOR, 2, false) => X86_64Reloc::Subtractor32,
        (macho::X86_64_RELOC_SUBTRACTOR, 3, false) => X86_64Reloc::Subtractor64,
        (macho::X86_64_RELOC_TLV, 2, true) => X86_64Reloc::Tlv,
        _ => return Err("Unsupported Mach-O x86-64 relocation"),
    };
    if let Some(prev) = prev {
        let expected = match prev.kind {
            RelocationKind::X86_64(X86_64Reloc::Subtractor32) => Some(X86_64Reloc::Unsigned32),
            RelocationKind::X86_64(X86_64Reloc::Subtractor64) => Some(X86_64Reloc::Unsigned64),
            _ => None,
        };
        if let Some(expected) = expected {
            if kind != expected || prev.address != site.address {
                return Err("Mach-O SUBTRACTOR relocation is not followed by UNSIGNED");
            }
        }
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reloc::{Arch, RelocationContext, RelocationTarget, SectionBounds};

    fn context() -> RelocationContext<'static> {
        static SECTIONS: [SectionBounds; 2] = [
            SectionBounds {
                address: 0,
                size: 0x40,
            },
            SectionBounds {
                address: 0x40,
                size: 0x10,
            },
        ];
        RelocationContext {
            arch: Arch::X86_64,
            sections: &SECTIONS,
            symbol_count: 3,
        }
    }

    #[test]
    fn call_to_undefined() {
        // callq _foo
        let info = RelocationInfo::plain(0x5, InfoFields::new(2, 2, true), true, 1);
        let reloc = context().decode(info, None).unwrap();
        assert_eq!(reloc.kind, RelocationKind::X86_64(X86_64Reloc::Branch32));
        assert_eq!(reloc.target, RelocationTarget::Symbol(1));
        assert_eq!(reloc.addend, 0);
        assert_eq!(reloc.howto().name, "BRANCH32");
        assert!(reloc.howto().pcrel);
    }

    #[test]
    fn section_target() {
        let info = RelocationInfo::plain(0x8, InfoFields::new(1, 2, true), false, 2);
        let reloc = context().decode(info, None).unwrap();
        assert_eq!(reloc.kind, RelocationKind::X86_64(X86_64Reloc::Signed));
        assert_eq!(reloc.target, RelocationTarget::Section(2));
        assert_eq!(reloc.addend, -0x40);
    }

    #[test]
    fn invalid_encodings() {
        let ctx = context();
        // SIGNED must be pc-relative.
        let info = RelocationInfo::plain(0, InfoFields::new(1, 2, false), true, 0);
        assert!(ctx.decode(info, None).is_err());
        // UNSIGNED cannot be pc-relative.
        let info = RelocationInfo::plain(0, InfoFields::new(0, 3, true), true, 0);
        assert!(ctx.decode(info, None).is_err());
        let info = RelocationInfo::scattered(0, InfoFields::new(0, 2, false), 0);
        assert!(ctx.decode(info, None).is_err());
    }

    #[test]
    fn subtractor_pairs() {
        let ctx = context();
        let sub = RelocationInfo::plain(0x10, InfoFields::new(5, 3, false), true, 0);
        let unsigned = RelocationInfo::plain(0x10, InfoFields::new(0, 3, false), true, 2);
        let relocs = ctx.decode_all([sub, unsigned]).unwrap();
        assert_eq!(relocs[0].kind, RelocationKind::X86_64(X86_64Reloc::Subtractor64));
        assert_eq!(relocs[1].kind, RelocationKind::X86_64(X86_64Reloc::Unsigned64));
        assert!(ctx.decode_all([sub]).is_err());
        let branch = RelocationInfo::plain(0x10, InfoFields::new(2, 2, true), true, 2);
        assert!(ctx.decode_all([sub, branch]).is_err());
    }

    #[test]
    fn info_fields_round_trip() {
        for kind in [
            X86_64Reloc::Signed1,
            X86_64Reloc::Signed4,
            X86_64Reloc::Branch8,
            X86_64Reloc::GotLoad,
            X86_64Reloc::Tlv,
        ] {
            let info = RelocationInfo::plain(0, kind.to_info_fields(), true, 0);
            assert_eq!(
                context().decode(info, None).unwrap().kind,
                RelocationKind::X86_64(kind)
            );
        }
    }
}
