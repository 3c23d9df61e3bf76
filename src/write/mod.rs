//! Interface for writing Mach-O object files and fat archives.
//!
//! [`Object`] holds the header fields, sections, symbols and extra load
//! commands of a file. [`Object::write`] computes the file layout,
//! synthesizes the segment and symbol table commands, and emits the file.
//!
//! [`FatBuilder`] packs several images into a fat archive.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::{fmt, result};
#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use std::{error, io};

use hashbrown::HashMap;

use crate::common::{Arch, SectionFlags};
use crate::endian::Endianness;
use crate::names;
use crate::reloc::{InfoFields, RelocationKind};

mod string;
pub use string::StringId;

mod util;
pub use util::*;

mod macho;

mod fat;
pub use fat::*;

#[cfg(feature = "read")]
mod from_file;

/// The error type used within the write module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error(pub(crate) String);

impl Error {
    #[inline]
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Error(message.into())
    }

    fn not_implemented(what: impl fmt::Display) -> Self {
        Error(alloc::format!("not implemented: {}", what))
    }

    /// The error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "std")]
impl error::Error for Error {}

#[cfg(feature = "read")]
impl From<crate::read::Error> for Error {
    fn from(error: crate::read::Error) -> Error {
        Error(String::from(error.0))
    }
}

/// The result type used within the write module.
pub type Result<T> = result::Result<T, Error>;

/// An identifier used to reference a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(pub usize);

/// An identifier used to reference a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub usize);

/// A writable Mach-O object file.
#[derive(Debug)]
pub struct Object<'a> {
    /// The `CPU_TYPE_*` value.
    pub cputype: u32,
    /// The `CPU_SUBTYPE_*` value.
    pub cpusubtype: u32,
    /// The `MH_*` file type.
    ///
    /// Only `MH_OBJECT` can be written.
    pub filetype: u32,
    /// The `MH_*` flags.
    pub flags: u32,
    /// Use the 64-bit layout.
    pub is_64: bool,
    /// The byte order of the file.
    pub endian: Endianness,
    /// Load commands that are emitted after the segment command.
    pub commands: Vec<Command>,
    sections: Vec<Section<'a>>,
    symbols: Vec<Symbol>,
    symbol_map: HashMap<Vec<u8>, SymbolId>,
}

impl<'a> Object<'a> {
    /// Create an empty relocatable object.
    ///
    /// The layout width is selected by the `CPU_ARCH_ABI64` bit of `cputype`.
    pub fn new(cputype: u32, cpusubtype: u32, endian: Endianness) -> Object<'a> {
        Object {
            cputype,
            cpusubtype,
            filetype: crate::macho::MH_OBJECT,
            flags: 0,
            is_64: cputype & crate::macho::CPU_ARCH_ABI64 != 0,
            endian,
            commands: Vec::new(),
            sections: Vec::new(),
            symbols: Vec::new(),
            symbol_map: HashMap::new(),
        }
    }

    /// The relocation architecture selected from the cpu type.
    #[inline]
    pub fn architecture(&self) -> Arch {
        Arch::from_cputype(self.cputype)
    }

    /// Add a section with the given Mach-O names and flags.
    ///
    /// The section is initially empty, with an alignment of 1.
    pub fn add_section(&mut self, segname: Vec<u8>, sectname: Vec<u8>, flags: u32) -> SectionId {
        let id = SectionId(self.sections.len());
        self.sections.push(Section {
            segname,
            sectname,
            flags,
            align: 0,
            data: Cow::Borrowed(&[]),
            size: 0,
            reserved1: 0,
            reserved2: 0,
            reserved3: 0,
            relocations: Vec::new(),
            indirect_symbols: Vec::new(),
        });
        id
    }

    /// Add a section with a portable name, such as `.text` or `__DATA.__mydata`.
    ///
    /// Well-known names use the flags and alignment of the name table.
    /// Otherwise the Mach-O flags are guessed from `flags`.
    pub fn add_portable_section(&mut self, name: &str, flags: SectionFlags) -> SectionId {
        let macho_name = names::to_macho(self.architecture(), name);
        let (macho_flags, align) = match macho_name.entry {
            Some(entry) => (entry.macho_flags(), entry.align),
            None => (names::guess_macho_flags(flags), 0),
        };
        let id = self.add_section(
            macho_name.segment().to_vec(),
            macho_name.section().to_vec(),
            macho_flags,
        );
        self.sections[id.0].align = align;
        id
    }

    /// Get a reference to a section.
    #[inline]
    pub fn section(&self, section: SectionId) -> &Section<'a> {
        &self.sections[section.0]
    }

    /// Get a mutable reference to a section.
    #[inline]
    pub fn section_mut(&mut self, section: SectionId) -> &mut Section<'a> {
        &mut self.sections[section.0]
    }

    /// The sections in the order they will be written.
    #[inline]
    pub fn sections(&self) -> &[Section<'a>] {
        &self.sections
    }

    /// Find a section by its Mach-O names.
    pub fn section_id(&self, segname: &[u8], sectname: &[u8]) -> Option<SectionId> {
        self.sections
            .iter()
            .position(|section| section.segname == segname && section.sectname == sectname)
            .map(SectionId)
    }

    /// Set the data of a section, replacing any existing data.
    ///
    /// `align` is the log2 of the alignment.
    pub fn set_section_data<T>(&mut self, section: SectionId, data: T, align: u32)
    where
        T: Into<Cow<'a, [u8]>>,
    {
        let section = &mut self.sections[section.0];
        section.data = data.into();
        section.size = section.data.len() as u64;
        section.align = align;
    }

    /// Append data to a section.
    ///
    /// Returns the offset of the data within the section.
    pub fn append_section_data(&mut self, section: SectionId, data: &[u8], align: u32) -> u64 {
        self.sections[section.0].append_data(data, align)
    }

    /// Reserve zero-initialized space in a zerofill section.
    ///
    /// Returns the offset of the space within the section.
    pub fn append_zerofill(&mut self, section: SectionId, size: u64, align: u32) -> u64 {
        self.sections[section.0].append_zerofill(size, align)
    }

    /// Add a symbol.
    ///
    /// Symbols are written in local, external, undefined order regardless of
    /// the order they are added in, so a [`SymbolId`] is not a symbol table
    /// index.
    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        if !symbol.name.is_empty() {
            self.symbol_map.entry(symbol.name.clone()).or_insert(id);
        }
        self.symbols.push(symbol);
        id
    }

    /// Get a reference to a symbol.
    #[inline]
    pub fn symbol(&self, symbol: SymbolId) -> &Symbol {
        &self.symbols[symbol.0]
    }

    /// Get a mutable reference to a symbol.
    ///
    /// The name must not be changed.
    #[inline]
    pub fn symbol_mut(&mut self, symbol: SymbolId) -> &mut Symbol {
        &mut self.symbols[symbol.0]
    }

    /// The symbols in the order they were added.
    #[inline]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Find the first symbol that was added with the given name.
    #[inline]
    pub fn symbol_id(&self, name: &[u8]) -> Option<SymbolId> {
        self.symbol_map.get(name).copied()
    }

    /// Add a relocation to a section.
    ///
    /// Relocations are written in the order they are added.
    pub fn add_relocation(&mut self, section: SectionId, relocation: Relocation) -> Result<()> {
        match relocation.target {
            RelocationTarget::Symbol(id) if id.0 >= self.symbols.len() => {
                return Err(Error::new("relocation references an invalid symbol"));
            }
            RelocationTarget::Section(id) if id.0 >= self.sections.len() => {
                return Err(Error::new("relocation references an invalid section"));
            }
            _ => {}
        }
        self.sections[section.0].relocations.push(relocation);
        Ok(())
    }

    /// Assign the next slot of a pointer or stub section.
    pub fn add_indirect_symbol(&mut self, section: SectionId, symbol: IndirectSymbol) {
        self.sections[section.0].indirect_symbols.push(symbol);
    }

    /// Write the object to a `Vec`.
    pub fn write(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.emit(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the object to a `Write` implementation.
    ///
    /// Also flushes the writer.
    ///
    /// It is advisable to use a buffered writer like [`BufWriter`](std::io::BufWriter)
    /// instead of an unbuffered writer like [`File`](std::fs::File).
    #[cfg(feature = "std")]
    pub fn write_stream<W: io::Write>(&self, w: W) -> result::Result<(), Box<dyn error::Error>> {
        let mut stream = StreamingBuffer::new(w);
        self.emit(&mut stream)?;
        stream.result()?;
        stream.into_inner().flush()?;
        Ok(())
    }

    /// Write the object to a `WritableBuffer`.
    pub fn emit(&self, buffer: &mut dyn WritableBuffer) -> Result<()> {
        self.macho_write(buffer)
    }
}

/// A load command that is written after the segment command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `LC_UUID`.
    Uuid([u8; 16]),
    /// One of the `LC_VERSION_MIN_*` commands.
    VersionMin {
        /// The command type.
        cmd: u32,
        /// The minimum OS version, encoded as `xxxx.yy.zz` nibbles.
        version: u32,
        /// The SDK version, encoded as `xxxx.yy.zz` nibbles.
        sdk: u32,
    },
    /// `LC_SOURCE_VERSION`.
    SourceVersion(u64),
    /// Any other command, with its raw bytes after the 8-byte prefix.
    ///
    /// The payload is written back verbatim.
    Opaque {
        /// The command type as stored in the file.
        cmd: u32,
        /// The command payload.
        data: Vec<u8>,
    },
}

/// A section in an [`Object`].
#[derive(Debug)]
pub struct Section<'a> {
    /// The segment name. At most 16 bytes.
    pub segname: Vec<u8>,
    /// The section name. At most 16 bytes.
    pub sectname: Vec<u8>,
    /// The section type and attribute bits.
    pub flags: u32,
    /// The log2 of the alignment.
    pub align: u32,
    /// The section contents. Must be empty for zerofill sections.
    pub data: Cow<'a, [u8]>,
    /// The size of a zerofill section.
    ///
    /// Ignored for other sections, which use the length of `data`.
    pub size: u64,
    /// The `reserved1` field.
    ///
    /// Replaced by the first indirect symbol index if `indirect_symbols`
    /// is not empty.
    pub reserved1: u32,
    /// The `reserved2` field, which holds the stub size for stub sections.
    pub reserved2: u32,
    /// The `reserved3` field. Only written for 64-bit files.
    pub reserved3: u32,
    /// The relocations, in the order they are written.
    pub relocations: Vec<Relocation>,
    /// The indirect symbol table entries for the slots of a pointer or stub
    /// section.
    pub indirect_symbols: Vec<IndirectSymbol>,
}

impl<'a> Section<'a> {
    /// Return true if the section takes no space in the file.
    pub fn is_zerofill(&self) -> bool {
        match self.flags & crate::macho::SECTION_TYPE {
            crate::macho::S_ZEROFILL | crate::macho::S_GB_ZEROFILL | crate::macho::S_THREAD_LOCAL_ZEROFILL => true,
            _ => false,
        }
    }

    /// The size of the section in memory.
    pub fn len(&self) -> u64 {
        if self.is_zerofill() {
            self.size
        } else {
            self.data.len() as u64
        }
    }

    /// Return true if the section is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn raise_align(&mut self, align: u32) {
        if self.align < align {
            self.align = align;
        }
    }

    /// Append data to the section.
    ///
    /// Returns the offset of the data within the section.
    pub fn append_data(&mut self, append_data: &[u8], align: u32) -> u64 {
        debug_assert!(!self.is_zerofill());
        self.raise_align(align);
        let align = 1usize << align;
        let data = self.data.to_mut();
        let mut offset = data.len();
        if offset & (align - 1) != 0 {
            offset += align - (offset & (align - 1));
            data.resize(offset, 0);
        }
        data.extend_from_slice(append_data);
        self.size = data.len() as u64;
        offset as u64
    }

    /// Reserve space in a zerofill section.
    ///
    /// Returns the offset of the space within the section.
    pub fn append_zerofill(&mut self, size: u64, align: u32) -> u64 {
        debug_assert!(self.data.is_empty());
        self.raise_align(align);
        let offset = align_u64(self.size, 1 << align);
        self.size = offset + size;
        offset
    }
}

/// The section that a [`Symbol`] is defined relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolSection {
    /// The symbol is undefined.
    Undefined,
    /// The symbol value is absolute.
    Absolute,
    /// The symbol is a common block, with the value holding its size.
    Common,
    /// The symbol is defined in the given section.
    Section(SectionId),
}

/// A symbol in an [`Object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The name of the symbol. Must not contain a NUL byte.
    pub name: Vec<u8>,
    /// The value of the symbol.
    ///
    /// This is relative to the section start for symbols defined in a
    /// section, and the size for common symbols.
    pub value: u64,
    /// The section of the symbol.
    pub section: SymbolSection,
    /// Whether the symbol is visible outside of the file.
    pub global: bool,
    /// Whether the symbol is a weak reference or weak definition.
    pub weak: bool,
    /// The `n_type` to write instead of one derived from the fields above.
    pub n_type: Option<u8>,
    /// The `n_sect` to write instead of one derived from `section`.
    pub n_sect: Option<u8>,
    /// The `n_desc` to write instead of one derived from `weak`.
    pub n_desc: Option<u16>,
}

impl Symbol {
    /// Create a symbol with the `n_*` fields derived on write.
    pub fn new(name: impl Into<Vec<u8>>, section: SymbolSection, value: u64, global: bool) -> Self {
        Symbol {
            name: name.into(),
            value,
            section,
            global,
            weak: false,
            n_type: None,
            n_sect: None,
            n_desc: None,
        }
    }
}

/// The target of a [`Relocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationTarget {
    /// An external relocation against a symbol.
    Symbol(SymbolId),
    /// A local relocation against a section.
    Section(SectionId),
    /// A local relocation without a section.
    Absolute,
    /// A scattered relocation with the given target address.
    Scattered {
        /// The address of the target.
        value: u32,
    },
    /// A non-scattered relocation with the given raw fields.
    ///
    /// This is used for records such as `ARM64_RELOC_ADDEND` whose
    /// `symbolnum` is not an index.
    Raw {
        /// The extern flag.
        r_extern: bool,
        /// The 24-bit symbol number field.
        symbolnum: u32,
    },
}

/// A relocation in a [`Section`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// The offset in the section of the place to relocate.
    pub address: u32,
    /// The type, length and pc-relative fields.
    pub fields: InfoFields,
    /// The target.
    pub target: RelocationTarget,
}

impl Relocation {
    /// Create a relocation of the given kind.
    pub fn new(address: u32, kind: RelocationKind, target: RelocationTarget) -> Self {
        Relocation {
            address,
            fields: kind.to_info_fields(),
            target,
        }
    }
}

/// An entry of the indirect symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndirectSymbol {
    /// The slot refers to a symbol.
    Symbol(SymbolId),
    /// `INDIRECT_SYMBOL_LOCAL`.
    Local,
    /// `INDIRECT_SYMBOL_LOCAL | INDIRECT_SYMBOL_ABS`.
    Absolute,
    /// A raw table entry.
    Raw(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_append() {
        let mut object = Object::new(crate::macho::CPU_TYPE_X86_64, 3, Endianness::Little);
        assert!(object.is_64);
        let text = object.add_portable_section(".text", SectionFlags::CODE);
        assert_eq!(object.section(text).segname, b"__TEXT");
        assert_eq!(object.section(text).sectname, b"__text");
        assert_eq!(object.section_id(b"__TEXT", b"__text"), Some(text));

        assert_eq!(object.append_section_data(text, &[1, 2, 3], 0), 0);
        assert_eq!(object.append_section_data(text, &[4], 3), 8);
        assert_eq!(object.section(text).len(), 9);
        assert_eq!(object.section(text).align, 3);

        let bss = object.add_section(b"__DATA".to_vec(), b"__bss".to_vec(), crate::macho::S_ZEROFILL);
        assert_eq!(object.append_zerofill(bss, 5, 0), 0);
        assert_eq!(object.append_zerofill(bss, 4, 2), 8);
        assert!(object.section(bss).is_zerofill());
        assert_eq!(object.section(bss).len(), 12);
    }

    #[test]
    fn symbol_lookup() {
        let mut object = Object::new(crate::macho::CPU_TYPE_X86, 3, Endianness::Little);
        assert!(!object.is_64);
        let foo = object.add_symbol(Symbol::new(&b"_foo"[..], SymbolSection::Undefined, 0, true));
        let again = object.add_symbol(Symbol::new(&b"_foo"[..], SymbolSection::Absolute, 1, false));
        assert_ne!(foo, again);
        assert_eq!(object.symbol_id(b"_foo"), Some(foo));
        assert_eq!(object.symbol_id(b"_bar"), None);

        let text = object.add_portable_section(".text", SectionFlags::CODE);
        let kind = RelocationKind::Generic(crate::reloc::GenericReloc::Vanilla32);
        let bad = Relocation::new(0, kind, RelocationTarget::Symbol(SymbolId(5)));
        assert!(object.add_relocation(text, bad).is_err());
        let good = Relocation::new(0, kind, RelocationTarget::Symbol(foo));
        assert!(object.add_relocation(text, good).is_ok());
        assert_eq!(object.section(text).relocations.len(), 1);
    }
}
