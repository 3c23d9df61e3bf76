//! # `macho-object`
//!
//! The `macho-object` crate reads and writes Mach-O object files, and the fat
//! (universal) archives that bundle several single-architecture images.
//!
//! ## Raw struct definitions
//!
//! The on-disk records are defined in the [`macho`] module. They use the
//! unaligned endian integer types from [`endian`], so they can be cast
//! directly from any byte offset.
//!
//! ## Reading
//!
//! [`read::macho::MachOFile`] classifies a byte slice, decodes the header and
//! every load command, and flattens the segments into one section array.
//! Symbols, the dynamic symbol table and the dynamic relocations are decoded
//! lazily on first use. Relocations are canonicalized per architecture by the
//! [`reloc`] engine.
//!
//! [`read::macho::MachOFatFile`] parses fat archive headers and extracts the
//! image for a given cpu type.
//!
//! ## Writing
//!
//! [`write::Object`] is an in-memory model of an object file. Its
//! [`write`](write::Object::write) method computes a file layout, synthesizes
//! the load commands and emits the file. [`write::FatBuilder`] packs images
//! into a fat archive.
//!
//! ## Example
//!
//! ```no_run
//! # #[cfg(all(feature = "read", feature = "std"))]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use macho_object::read::macho::MachOFile;
//!
//! let data = std::fs::read("path/to/file.o")?;
//! let file = MachOFile::parse(&*data)?;
//! for section in file.sections() {
//!     println!("{}", section.portable_name());
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "read", feature = "std")))]
//! # fn main() {}
//! ```

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![no_std]
#![warn(rust_2018_idioms)]
// Style.
#![allow(clippy::collapsible_if)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::manual_flatten)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::single_match)]
#![allow(clippy::type_complexity)]
// Occurs due to fallible iteration.
#![allow(clippy::should_implement_trait)]
// Unit errors are converted to other types by callers.
#![allow(clippy::result_unit_err)]

extern crate alloc;

#[cfg(feature = "std")]
#[allow(unused_imports)]
#[macro_use]
extern crate std;

pub mod endian;
pub use endian::*;

#[macro_use]
pub mod pod;
pub use pod::*;

mod common;
pub use common::*;

pub mod macho;
pub mod names;
pub mod reloc;

#[cfg(feature = "read")]
pub mod read;

#[cfg(feature = "write")]
pub mod write;
