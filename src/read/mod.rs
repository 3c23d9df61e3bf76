//! Interface for reading Mach-O files.
//!
//! The entry points are [`MachOFile::parse`] for single-architecture images
//! and [`MachOFatFile::parse`] for universal archives. [`FileKind::parse`]
//! can be used to decide between them.

use core::{fmt, result};

mod read_ref;
pub use read_ref::*;

mod util;
pub use util::*;

pub mod macho;
pub use macho::*;

/// The error type used within the read module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error(pub(crate) &'static str);

const FORMAT_MISMATCH: &str = "Unknown Mach-O file magic";

impl Error {
    /// The error returned when the data does not start with a known magic.
    #[inline]
    pub(crate) fn format_mismatch() -> Error {
        Error(FORMAT_MISMATCH)
    }

    /// Return true if the data was not recognized as a Mach-O file at all.
    ///
    /// Callers that probe several formats can use this to continue with
    /// the next format instead of reporting a corrupt file.
    #[inline]
    pub fn is_format_mismatch(&self) -> bool {
        self.0 == FORMAT_MISMATCH
    }

    /// The error message.
    #[inline]
    pub fn message(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// The result type used within the read module.
pub type Result<T> = result::Result<T, Error>;

pub(crate) trait ReadError<T> {
    fn read_error(self, error: &'static str) -> Result<T>;
}

impl<T> ReadError<T> for result::Result<T, ()> {
    fn read_error(self, error: &'static str) -> Result<T> {
        self.map_err(|()| Error(error))
    }
}

impl<T> ReadError<T> for result::Result<T, Error> {
    fn read_error(self, error: &'static str) -> Result<T> {
        self.map_err(|_| Error(error))
    }
}

impl<T> ReadError<T> for Option<T> {
    fn read_error(self, error: &'static str) -> Result<T> {
        self.ok_or(Error(error))
    }
}

/// The kind of a file, as determined by its magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileKind {
    /// A 32-bit Mach-O file.
    ///
    /// See [`MachOFile`].
    MachO32,
    /// A 64-bit Mach-O file.
    ///
    /// See [`MachOFile`].
    MachO64,
    /// A universal archive of Mach-O files.
    ///
    /// See [`MachOFatFile`].
    MachOFat32,
}

impl FileKind {
    /// Determine a file kind by parsing the start of the file.
    pub fn parse<'data, R: ReadRef<'data>>(data: R) -> Result<FileKind> {
        Self::parse_at(data, 0)
    }

    /// Determine a file kind by parsing at the given offset.
    pub fn parse_at<'data, R: ReadRef<'data>>(data: R, offset: u64) -> Result<FileKind> {
        let magic = data
            .read_bytes_at(offset, 4)
            .read_error("Could not read file magic")?;
        let magic = u32::from_be_bytes([magic[0], magic[1], magic[2], magic[3]]);
        match magic {
            crate::macho::MH_MAGIC | crate::macho::MH_CIGAM => Ok(FileKind::MachO32),
            crate::macho::MH_MAGIC_64 | crate::macho::MH_CIGAM_64 => Ok(FileKind::MachO64),
            crate::macho::FAT_MAGIC => Ok(FileKind::MachOFat32),
            _ => Err(Error::format_mismatch()),
        }
    }
}

/// The index used to identify a section in a file.
///
/// This is the Mach-O section number: the first section has index 1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionIndex(pub usize);

impl fmt::Display for SectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The index used to identify a symbol in a symbol table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolIndex(pub usize);

impl fmt::Display for SymbolIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kinds() {
        assert_eq!(
            FileKind::parse(&[0xfe, 0xed, 0xfa, 0xce][..]),
            Ok(FileKind::MachO32)
        );
        assert_eq!(
            FileKind::parse(&[0xce, 0xfa, 0xed, 0xfe][..]),
            Ok(FileKind::MachO32)
        );
        assert_eq!(
            FileKind::parse(&[0xcf, 0xfa, 0xed, 0xfe][..]),
            Ok(FileKind::MachO64)
        );
        assert_eq!(
            FileKind::parse(&[0xca, 0xfe, 0xba, 0xbe][..]),
            Ok(FileKind::MachOFat32)
        );
        let error = FileKind::parse(&b"\x7fELF"[..]).unwrap_err();
        assert!(error.is_format_mismatch());
        let error = FileKind::parse(&[0xfe, 0xed][..]).unwrap_err();
        assert!(!error.is_format_mismatch());
    }
}
