//! Types for compile-time and run-time endianness.
//!
//! Mach-O records may start at any offset inside a fat archive or a `Vec`,
//! so the integer wrappers in this module store their bytes in arrays and
//! have an alignment of 1.

use crate::pod::Pod;
use core::fmt::{self, Debug};
use core::marker::PhantomData;

/// A trait for using an endianness specification.
///
/// Provides methods for converting between the specified endianness and
/// the native endianness of the target machine.
pub trait Endian: Debug + Default + Clone + Copy + PartialEq + Eq + 'static {
    /// Construct a specification for the endianness of some values.
    ///
    /// Returns `None` if the type does not support specified endianness.
    fn from_big_endian(big_endian: bool) -> Option<Self>;

    /// Construct a specification for the endianness of some values.
    ///
    /// Returns `None` if the type does not support specified endianness.
    fn from_little_endian(little_endian: bool) -> Option<Self> {
        Self::from_big_endian(!little_endian)
    }

    /// Return true for big endian byte order.
    fn is_big_endian(self) -> bool;

    /// Return true for little endian byte order.
    #[inline]
    fn is_little_endian(self) -> bool {
        !self.is_big_endian()
    }

    /// Converts an unsigned 16 bit integer to native endian.
    #[inline]
    fn read_u16_bytes(self, n: [u8; 2]) -> u16 {
        if self.is_big_endian() {
            u16::from_be_bytes(n)
        } else {
            u16::from_le_bytes(n)
        }
    }

    /// Converts an unsigned 32 bit integer to native endian.
    #[inline]
    fn read_u32_bytes(self, n: [u8; 4]) -> u32 {
        if self.is_big_endian() {
            u32::from_be_bytes(n)
        } else {
            u32::from_le_bytes(n)
        }
    }

    /// Converts an unsigned 64 bit integer to native endian.
    #[inline]
    fn read_u64_bytes(self, n: [u8; 8]) -> u64 {
        if self.is_big_endian() {
            u64::from_be_bytes(n)
        } else {
            u64::from_le_bytes(n)
        }
    }

    /// Converts an unsigned 16 bit integer from native endian.
    #[inline]
    fn write_u16_bytes(self, n: u16) -> [u8; 2] {
        if self.is_big_endian() {
            u16::to_be_bytes(n)
        } else {
            u16::to_le_bytes(n)
        }
    }

    /// Converts an unsigned 32 bit integer from native endian.
    #[inline]
    fn write_u32_bytes(self, n: u32) -> [u8; 4] {
        if self.is_big_endian() {
            u32::to_be_bytes(n)
        } else {
            u32::to_le_bytes(n)
        }
    }

    /// Converts an unsigned 64 bit integer from native endian.
    #[inline]
    fn write_u64_bytes(self, n: u64) -> [u8; 8] {
        if self.is_big_endian() {
            u64::to_be_bytes(n)
        } else {
            u64::to_le_bytes(n)
        }
    }
}

/// An endianness that is selectable at run-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Little endian byte order.
    Little,
    /// Big endian byte order.
    Big,
}

impl Default for Endianness {
    #[cfg(target_endian = "little")]
    #[inline]
    fn default() -> Endianness {
        Endianness::Little
    }

    #[cfg(target_endian = "big")]
    #[inline]
    fn default() -> Endianness {
        Endianness::Big
    }
}

impl Endian for Endianness {
    #[inline]
    fn from_big_endian(big_endian: bool) -> Option<Self> {
        Some(if big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        })
    }

    #[inline]
    fn is_big_endian(self) -> bool {
        self != Endianness::Little
    }
}

/// Compile-time little endian byte order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LittleEndian;

impl Endian for LittleEndian {
    #[inline]
    fn from_big_endian(big_endian: bool) -> Option<Self> {
        if big_endian {
            None
        } else {
            Some(LittleEndian)
        }
    }

    #[inline]
    fn is_big_endian(self) -> bool {
        false
    }
}

/// Compile-time big endian byte order.
///
/// Fat archive headers are always stored in this byte order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigEndian;

impl Endian for BigEndian {
    #[inline]
    fn from_big_endian(big_endian: bool) -> Option<Self> {
        if big_endian {
            Some(BigEndian)
        } else {
            None
        }
    }

    #[inline]
    fn is_big_endian(self) -> bool {
        true
    }
}

macro_rules! endian_int {
    ($name:ident, $native:ty, $len:expr, $read:ident, $write:ident) => {
        #[doc = concat!("An unaligned `", stringify!($native), "` value with an externally specified endianness of type `E`.")]
        #[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name<E: Endian>([u8; $len], PhantomData<E>);

        impl<E: Endian> $name<E> {
            /// Construct a new value given bytes that already have the required endianness.
            #[inline]
            pub fn from_bytes(n: [u8; $len]) -> Self {
                Self(n, PhantomData)
            }

            /// Construct a new value given a native endian value.
            #[inline]
            pub fn new(e: E, n: $native) -> Self {
                Self(e.$write(n), PhantomData)
            }

            /// Return the value as a native endian value.
            #[inline]
            pub fn get(self, e: E) -> $native {
                e.$read(self.0)
            }

            /// Set the value given a native endian value.
            #[inline]
            pub fn set(&mut self, e: E, n: $native) {
                self.0 = e.$write(n);
            }
        }

        impl<E: Endian> Debug for $name<E> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                // The endianness is unknown here, so show the raw bytes.
                write!(f, "{:02x?}", self.0)
            }
        }

        unsafe impl<E: Endian> Pod for $name<E> {}
    };
}

endian_int!(U16, u16, 2, read_u16_bytes, write_u16_bytes);
endian_int!(U32, u32, 4, read_u32_bytes, write_u32_bytes);
endian_int!(U64, u64, 8, read_u64_bytes, write_u64_bytes);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let value = U32::new(BigEndian, 0xfeed_facf);
        assert_eq!(value.0, [0xfe, 0xed, 0xfa, 0xcf]);
        assert_eq!(value.get(BigEndian), 0xfeed_facf);

        let value = U32::<Endianness>::from_bytes([0xcf, 0xfa, 0xed, 0xfe]);
        assert_eq!(value.get(Endianness::Little), 0xfeed_facf);
        assert_eq!(value.get(Endianness::Big), 0xcffa_edfe);

        let mut value = U64::new(LittleEndian, 0);
        value.set(LittleEndian, 0x0102_0304_0506_0708);
        assert_eq!(value.0, [8, 7, 6, 5, 4, 3, 2, 1]);

        assert_eq!(U16::new(Endianness::Big, 0x1234).0, [0x12, 0x34]);
    }

    #[test]
    fn selection() {
        assert_eq!(Endianness::from_big_endian(true), Some(Endianness::Big));
        assert_eq!(Endianness::from_little_endian(true), Some(Endianness::Little));
        assert_eq!(BigEndian::from_big_endian(false), None);
        assert_eq!(LittleEndian::from_big_endian(false), Some(LittleEndian));
        assert!(Endianness::Little.is_little_endian());
    }
}
