//! Tools for converting Mach-O records to and from bytes.
//!
//! This module should be replaced once rust provides safe transmutes.

// This module provides functions for both read and write features.
#![cfg_attr(not(all(feature = "read", feature = "write")), allow(dead_code))]

use core::{fmt, mem, slice};

/// A trait for types that can safely be converted from and to byte slices.
///
/// A type that is `Pod` must:
/// - be `#[repr(C)]` or `#[repr(transparent)]`
/// - have no invalid byte values
/// - have no padding
pub unsafe trait Pod: Copy + 'static {}

/// Cast the head of a byte slice to a `Pod` type.
///
/// Returns the value and the remaining bytes.
#[inline]
pub fn from_bytes<T: Pod>(data: &[u8]) -> Option<(&T, &[u8])> {
    let ptr = data.as_ptr();
    if (ptr as usize) % mem::align_of::<T>() != 0 {
        return None;
    }
    let size = mem::size_of::<T>();
    let tail = data.get(size..)?;
    // Safety:
    // The alignment and size are checked by this function.
    // The Pod trait ensures the type is valid to cast from bytes.
    let val = unsafe { &*ptr.cast() };
    Some((val, tail))
}

/// Cast the head of a byte slice to a slice of `count` `Pod` values.
///
/// Returns the values and the remaining bytes.
#[inline]
pub fn slice_from_bytes<T: Pod>(data: &[u8], count: usize) -> Option<(&[T], &[u8])> {
    let ptr = data.as_ptr();
    if (ptr as usize) % mem::align_of::<T>() != 0 {
        return None;
    }
    let size = count.checked_mul(mem::size_of::<T>())?;
    let tail = data.get(size..)?;
    // Safety:
    // The alignment and size are checked by this function.
    // The Pod trait ensures the type is valid to cast from bytes.
    let slice = unsafe { slice::from_raw_parts(ptr.cast(), count) };
    Some((slice, tail))
}

/// Cast a `Pod` type to a byte slice.
#[inline]
pub fn bytes_of<T: Pod>(val: &T) -> &[u8] {
    let size = mem::size_of::<T>();
    // Safety:
    // Any alignment is allowed.
    // The size is determined in this function.
    // The Pod trait ensures the type is valid to cast to bytes.
    unsafe { slice::from_raw_parts(slice::from_ref(val).as_ptr().cast(), size) }
}

/// Cast a slice of a `Pod` type to a byte slice.
#[inline]
pub fn bytes_of_slice<T: Pod>(val: &[T]) -> &[u8] {
    let size = val.len().wrapping_mul(mem::size_of::<T>());
    // Safety:
    // Any alignment is allowed.
    // The size is determined in this function.
    // The Pod trait ensures the type is valid to cast to bytes.
    unsafe { slice::from_raw_parts(val.as_ptr().cast(), size) }
}

/// A newtype for byte slices.
///
/// It has these important features:
/// - no methods that can panic, such as `Index`
/// - convenience methods for `Pod` types
/// - a useful `Debug` implementation
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Bytes<'data>(pub &'data [u8]);

impl<'data> fmt::Debug for Bytes<'data> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_list_bytes(self.0, fmt)
    }
}

impl<'data> Bytes<'data> {
    /// Return the length of the byte slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the byte slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Skip over the given number of bytes at the start of the byte slice.
    ///
    /// Modifies the byte slice to start after the bytes.
    ///
    /// Returns an error if there are not enough bytes in the slice.
    #[inline]
    pub fn skip(&mut self, offset: usize) -> Result<(), ()> {
        match self.0.get(offset..) {
            Some(tail) => {
                self.0 = tail;
                Ok(())
            }
            None => {
                self.0 = &[];
                Err(())
            }
        }
    }

    /// Return a reference to the given number of bytes at the start of the byte slice.
    ///
    /// Modifies the byte slice to start after the bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<Bytes<'data>, ()> {
        match (self.0.get(..count), self.0.get(count..)) {
            (Some(head), Some(tail)) => {
                self.0 = tail;
                Ok(Bytes(head))
            }
            _ => {
                self.0 = &[];
                Err(())
            }
        }
    }

    /// Return a reference to the given number of bytes at the given offset of the byte slice.
    #[inline]
    pub fn read_bytes_at(mut self, offset: usize, count: usize) -> Result<Bytes<'data>, ()> {
        self.skip(offset)?;
        self.read_bytes(count)
    }

    /// Return a reference to a `Pod` struct at the start of the byte slice.
    ///
    /// Modifies the byte slice to start after the bytes.
    #[inline]
    pub fn read<T: Pod>(&mut self) -> Result<&'data T, ()> {
        match from_bytes(self.0) {
            Some((value, tail)) => {
                self.0 = tail;
                Ok(value)
            }
            None => {
                self.0 = &[];
                Err(())
            }
        }
    }

    /// Return a reference to a `Pod` struct at the given offset of the byte slice.
    #[inline]
    pub fn read_at<T: Pod>(mut self, offset: usize) -> Result<&'data T, ()> {
        self.skip(offset)?;
        self.read()
    }

    /// Return a reference to a slice of `Pod` structs at the start of the byte slice.
    ///
    /// Modifies the byte slice to start after the bytes.
    #[inline]
    pub fn read_slice<T: Pod>(&mut self, count: usize) -> Result<&'data [T], ()> {
        match slice_from_bytes(self.0, count) {
            Some((value, tail)) => {
                self.0 = tail;
                Ok(value)
            }
            None => {
                self.0 = &[];
                Err(())
            }
        }
    }

    /// Return a reference to a slice of `Pod` structs at the given offset of the byte slice.
    #[inline]
    pub fn read_slice_at<T: Pod>(mut self, offset: usize, count: usize) -> Result<&'data [T], ()> {
        self.skip(offset)?;
        self.read_slice(count)
    }

    /// Read a null terminated string.
    ///
    /// Does not assume any encoding.
    /// Reads past the null byte, but doesn't return it.
    #[inline]
    pub fn read_string(&mut self) -> Result<&'data [u8], ()> {
        match memchr::memchr(b'\0', self.0) {
            Some(null) => {
                // These will never fail.
                let bytes = self.read_bytes(null)?;
                self.skip(1)?;
                Ok(bytes.0)
            }
            None => {
                self.0 = &[];
                Err(())
            }
        }
    }

    /// Read a null terminated string at an offset.
    ///
    /// Does not assume any encoding. Does not return the null byte.
    #[inline]
    pub fn read_string_at(mut self, offset: usize) -> Result<&'data [u8], ()> {
        self.skip(offset)?;
        self.read_string()
    }
}

// Only for Debug impl of `Bytes`.
fn debug_list_bytes(bytes: &[u8], fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut list = fmt.debug_list();
    list.entries(bytes.iter().take(8).copied().map(DebugByte));
    if bytes.len() > 8 {
        list.entry(&DebugLen(bytes.len()));
    }
    list.finish()
}

struct DebugByte(u8);

impl fmt::Debug for DebugByte {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "0x{:02x}", self.0)
    }
}

struct DebugLen(usize);

impl fmt::Debug for DebugLen {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "...; {}", self.0)
    }
}

macro_rules! unsafe_impl_pod {
    ($($struct_name:ident),+ $(,)?) => {
        $(
            unsafe impl<E: crate::endian::Endian> crate::pod::Pod for $struct_name<E> { }
        )+
    }
}

unsafe impl Pod for u8 {}
unsafe impl<const N: usize> Pod for [u8; N] {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endian::{BigEndian, LittleEndian, U16, U32};
    use alloc::format;

    #[test]
    fn single() {
        let magic = U32::new(BigEndian, 0xcafe_babe);
        let bytes = bytes_of(&magic);
        assert_eq!(bytes, [0xca, 0xfe, 0xba, 0xbe]);

        let (value, tail) = from_bytes::<U32<BigEndian>>(bytes).unwrap();
        assert_eq!(value.get(BigEndian), 0xcafe_babe);
        assert!(tail.is_empty());

        let (value, tail) = from_bytes::<U16<LittleEndian>>(&bytes[1..]).unwrap();
        assert_eq!(value.get(LittleEndian), 0xbafe);
        assert_eq!(tail, &[0xbe]);

        assert!(from_bytes::<U32<BigEndian>>(&bytes[1..]).is_none());
    }

    #[test]
    fn slice() {
        let words = [U32::new(LittleEndian, 1), U32::new(LittleEndian, 0x8000_0000)];
        let bytes = bytes_of_slice(&words);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[4..], [0, 0, 0, 0x80]);

        let (y, tail) = slice_from_bytes::<U32<LittleEndian>>(bytes, 2).unwrap();
        assert_eq!(y, words);
        assert!(tail.is_empty());

        let (y, tail) = slice_from_bytes::<U32<LittleEndian>>(&bytes[1..], 1).unwrap();
        assert_eq!(y[0].get(LittleEndian), 0);
        assert_eq!(tail, &bytes[5..]);

        assert!(slice_from_bytes::<U32<LittleEndian>>(bytes, 3).is_none());
        assert!(slice_from_bytes::<U32<LittleEndian>>(bytes, usize::MAX).is_none());
    }

    #[test]
    fn bytes() {
        let data = Bytes(b"__TEXT\0__text\0");

        let mut bytes = data;
        assert_eq!(bytes.read_string(), Ok(&b"__TEXT"[..]));
        assert_eq!(bytes.read_string(), Ok(&b"__text"[..]));
        assert_eq!(bytes.read_string(), Err(()));
        assert!(bytes.is_empty());

        assert_eq!(data.read_string_at(2), Ok(&b"TEXT"[..]));
        assert_eq!(data.read_string_at(6), Ok(&b""[..]));
        assert_eq!(data.read_string_at(14), Err(()));
        assert_eq!(data.read_string_at(15), Err(()));

        let mut bytes = data;
        assert_eq!(bytes.skip(7), Ok(()));
        assert_eq!(bytes.read_bytes(2), Ok(Bytes(b"__")));
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes.read_bytes(6), Err(()));
        assert!(bytes.is_empty());

        let mut bytes = data;
        assert_eq!(bytes.skip(15), Err(()));
        assert!(bytes.is_empty());

        assert_eq!(data.read_bytes_at(2, 4), Ok(Bytes(b"TEXT")));
        assert_eq!(data.read_bytes_at(14, 1), Err(()));

        let mut bytes = data;
        assert_eq!(
            bytes.read::<U16<BigEndian>>().map(|x| x.get(BigEndian)),
            Ok(0x5f5f)
        );
        assert_eq!(bytes.len(), 12);
        assert_eq!(
            data.read_at::<U32<BigEndian>>(10).map(|x| x.get(BigEndian)),
            Ok(0x6578_7400)
        );
        assert!(data.read_at::<U32<BigEndian>>(11).is_err());

        assert_eq!(data.read_slice_at::<u8>(8, 5), Ok(&b"_text"[..]));
        assert!(data.read_slice_at::<u8>(8, 7).is_err());
    }

    #[test]
    fn bytes_debug() {
        assert_eq!(format!("{:?}", Bytes(&[])), "[]");
        assert_eq!(format!("{:?}", Bytes(&[0xfe])), "[0xfe]");
        assert_eq!(
            format!(
                "{:?}",
                Bytes(&[0xcf, 0xfa, 0xed, 0xfe, 0x07, 0x00, 0x00, 0x01, 0x03])
            ),
            "[0xcf, 0xfa, 0xed, 0xfe, 0x07, 0x00, 0x00, 0x01, ...; 9]"
        );
    }
}
