//! Support for reading Mach-O files.
//!
//! Traits are used to abstract over the difference between 32-bit and 64-bit
//! Mach-O files. The decoded types ([`Header`], [`LoadCommand`],
//! [`MachOSection`], [`MachOSymbol`]) are independent of the width and byte
//! order of the file.
//!
//! [`MachOFile`] is the entry point for single-architecture images, and
//! [`MachOFatFile`] for universal archives.

mod file;
pub use file::*;

mod header;
pub use header::*;

mod load_command;
pub use load_command::*;

mod segment;
pub use segment::*;

mod section;
pub use section::*;

mod symbol;
pub use symbol::*;

mod dysymtab;
pub use dysymtab::*;

mod relocation;
pub use relocation::RelocationInfoIterator;

mod fat;
pub use fat::*;
