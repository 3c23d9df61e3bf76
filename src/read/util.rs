use core::fmt;

use crate::read::ReadRef;

/// Round `offset` up to a multiple of `size`, which must be a power of two.
#[inline]
pub(crate) fn align(offset: u64, size: u64) -> u64 {
    (offset + (size - 1)) & !(size - 1)
}

/// A table of NUL terminated strings.
///
/// Index 0 is the empty string when the table starts with a NUL, as Mach-O
/// string tables do.
#[derive(Clone, Copy)]
pub struct StringTable<'data, R = &'data [u8]>
where
    R: ReadRef<'data>,
{
    data: Option<R>,
    start: u64,
    end: u64,
    marker: core::marker::PhantomData<&'data ()>,
}

impl<'data, R: ReadRef<'data>> StringTable<'data, R> {
    /// Interpret the given data as a string table.
    pub fn new(data: R, start: u64, end: u64) -> Self {
        StringTable {
            data: Some(data),
            start,
            end,
            marker: Default::default(),
        }
    }

    /// The size of the table in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Return true if the table has no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the string at the given offset.
    ///
    /// The string runs to the next NUL. A string that is not terminated
    /// within the table is an error.
    pub fn get(&self, offset: u32) -> Result<&'data [u8], ()> {
        match self.data {
            Some(data) => {
                let r_start = self.start.checked_add(offset.into()).ok_or(())?;
                if r_start >= self.end {
                    return Err(());
                }
                data.read_bytes_at_until(r_start..self.end, 0)
            }
            None => Err(()),
        }
    }

    /// The raw bytes of the table.
    pub fn data(&self) -> Result<&'data [u8], ()> {
        match self.data {
            Some(data) => data.read_bytes_at(self.start, self.len()),
            None => Ok(&[]),
        }
    }
}

impl<'data, R: ReadRef<'data>> Default for StringTable<'data, R> {
    fn default() -> Self {
        StringTable {
            data: None,
            start: 0,
            end: 0,
            marker: Default::default(),
        }
    }
}

impl<'data, R: ReadRef<'data>> fmt::Debug for StringTable<'data, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringTable")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        let data: &[u8] = b"xx\0_foo\0_bar";
        let strings = StringTable::new(data, 2, data.len() as u64);
        assert_eq!(strings.get(0), Ok(&b""[..]));
        assert_eq!(strings.get(1), Ok(&b"_foo"[..]));
        assert_eq!(strings.get(3), Ok(&b"oo"[..]));
        // Not terminated.
        assert_eq!(strings.get(6), Err(()));
        assert_eq!(strings.get(100), Err(()));
        assert_eq!(StringTable::<&[u8]>::default().get(0), Err(()));
        assert_eq!(align(5, 4), 8);
        assert_eq!(align(8, 4), 8);
    }
}
