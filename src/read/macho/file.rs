use alloc::vec::Vec;
use core::cell::OnceCell;

use crate::common::Arch;
use crate::endian::Endianness;
use crate::macho;
use crate::read::{Error, FileKind, ReadError, ReadRef, Result, SectionIndex, SymbolIndex};
use crate::reloc::{Relocation, RelocationContext, SectionBounds};

use super::{
    load_command, relocation, DysymtabTables, EntryPoint, Header, LoadCommand,
    LoadCommandVariant, MachHeader, MachOSection, MachOSegment, MachOSymbol,
    RelocationInfoIterator, StubSymbol, SymbolTable, Symtab,
};

/// A parsed single-architecture Mach-O image.
///
/// The header, load commands and sections are decoded by [`MachOFile::parse`].
/// The symbol table, the dynamic symbol table and the dynamic relocations
/// are decoded on first use and cached.
#[derive(Debug)]
pub struct MachOFile<'data, R = &'data [u8]>
where
    R: ReadRef<'data>,
{
    data: R,
    offset: u64,
    header: Header,
    arch: Arch,
    commands: Vec<LoadCommand<'data>>,
    sections: Vec<MachOSection>,
    bounds: Vec<SectionBounds>,
    symtab: Option<Symtab>,
    symbols: OnceCell<Result<SymbolTable<'data, R>>>,
    dysymtab: OnceCell<Result<Option<DysymtabTables>>>,
    dynamic_relocations: OnceCell<Result<Vec<Relocation>>>,
}

impl<'data, R: ReadRef<'data>> MachOFile<'data, R> {
    /// Parse the image at the start of `data`.
    pub fn parse(data: R) -> Result<Self> {
        Self::parse_at(data, 0)
    }

    /// Parse an image that starts at `offset` within `data`.
    ///
    /// File offsets within the image are relative to `offset`.
    pub fn parse_at(data: R, offset: u64) -> Result<Self> {
        match FileKind::parse_at(data, offset)? {
            FileKind::MachO32 => Self::parse_image::<macho::MachHeader32<Endianness>>(data, offset),
            FileKind::MachO64 => Self::parse_image::<macho::MachHeader64<Endianness>>(data, offset),
            _ => Err(Error("Mach-O fat archive must be parsed with MachOFatFile")),
        }
    }

    fn parse_image<Mach: MachHeader<Endian = Endianness>>(data: R, offset: u64) -> Result<Self> {
        let raw = Mach::parse(data, offset)?;
        let endian = raw.endian()?;
        let header = Header::from_raw(raw, endian);
        let arch = Arch::from_cputype(header.cputype);
        let table = load_command::parse_commands::<Mach, R>(data, offset, &header, arch)?;
        let bounds = relocation::section_bounds(&table.sections);
        Ok(MachOFile {
            data,
            offset,
            header,
            arch,
            commands: table.commands,
            sections: table.sections,
            bounds,
            symtab: table.symtab,
            symbols: OnceCell::new(),
            dysymtab: OnceCell::new(),
            dynamic_relocations: OnceCell::new(),
        })
    }

    /// The data that the image was parsed from.
    #[inline]
    pub fn data(&self) -> R {
        self.data
    }

    /// The offset of the image header within [`Self::data`].
    #[inline]
    pub fn image_offset(&self) -> u64 {
        self.offset
    }

    /// The decoded header.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Return true for the 64-bit layout.
    #[inline]
    pub fn is_64(&self) -> bool {
        self.header.is_64
    }

    /// The byte order of the image.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.header.endian
    }

    /// The relocation architecture selected from the cpu type.
    #[inline]
    pub fn architecture(&self) -> Arch {
        self.arch
    }

    /// The `MH_*` file type.
    #[inline]
    pub fn filetype(&self) -> u32 {
        self.header.filetype
    }

    /// The `MH_*` flags.
    #[inline]
    pub fn flags(&self) -> u32 {
        self.header.flags
    }

    /// The load commands in file order.
    #[inline]
    pub fn commands(&self) -> &[LoadCommand<'data>] {
        &self.commands
    }

    /// The first load command with the given type.
    ///
    /// `cmd` is compared with the type as stored in the file, including
    /// `LC_REQ_DYLD`.
    pub fn command_by_type(&self, cmd: u32) -> Option<&LoadCommand<'data>> {
        self.commands.iter().find(|command| command.raw_cmd() == cmd)
    }

    /// All load commands with the given type.
    pub fn commands_by_type(&self, cmd: u32) -> impl Iterator<Item = &LoadCommand<'data>> + '_ {
        self.commands
            .iter()
            .filter(move |command| command.raw_cmd() == cmd)
    }

    /// The UUID from `LC_UUID`.
    pub fn uuid(&self) -> Option<[u8; 16]> {
        self.commands.iter().find_map(|command| match command.variant {
            LoadCommandVariant::Uuid(uuid) => Some(uuid),
            _ => None,
        })
    }

    /// The `LC_MAIN` entry point.
    pub fn entry_point(&self) -> Option<EntryPoint> {
        self.commands.iter().find_map(|command| match command.variant {
            LoadCommandVariant::Main(entry) => Some(entry),
            _ => None,
        })
    }

    /// The address of the first instruction to execute.
    ///
    /// This is derived from `LC_MAIN` and the `__TEXT` segment, or else from
    /// the register state of a thread command.
    pub fn start_address(&self) -> Option<u64> {
        if let Some(entry) = self.entry_point() {
            let text = self.segments().find(|segment| segment.name() == b"__TEXT")?;
            return entry
                .entryoff
                .checked_sub(text.fileoff)
                .map(|offset| text.vmaddr.wrapping_add(offset));
        }
        self.commands.iter().find_map(|command| match &command.variant {
            LoadCommandVariant::Thread(thread) => thread.pc(self.arch, self.header.endian),
            _ => None,
        })
    }

    /// The segments in file order.
    pub fn segments(&self) -> impl Iterator<Item = &MachOSegment> + '_ {
        self.commands.iter().filter_map(|command| match &command.variant {
            LoadCommandVariant::Segment(segment) => Some(segment),
            _ => None,
        })
    }

    /// The sections of a segment.
    pub fn segment_sections(&self, segment: &MachOSegment) -> &[MachOSection] {
        self.sections.get(segment.sections.clone()).unwrap_or(&[])
    }

    /// All sections, in Mach-O section number order.
    #[inline]
    pub fn sections(&self) -> &[MachOSection] {
        &self.sections
    }

    /// The section with the given Mach-O section number.
    pub fn section_by_index(&self, index: SectionIndex) -> Result<&MachOSection> {
        index
            .0
            .checked_sub(1)
            .and_then(|index| self.sections.get(index))
            .read_error("Invalid Mach-O section index")
    }

    /// The first section with the given segment and section names.
    pub fn section_by_name(&self, segname: &[u8], sectname: &[u8]) -> Option<&MachOSection> {
        self.sections
            .iter()
            .find(|section| section.segment_name() == segname && section.name() == sectname)
    }

    /// The first section with the given portable name.
    pub fn section_by_portable_name(&self, name: &str) -> Option<&MachOSection> {
        self.sections
            .iter()
            .find(|section| section.portable_name() == name)
    }

    /// The contents of a section.
    ///
    /// Returns an empty slice for zerofill sections.
    pub fn section_data(&self, section: &MachOSection) -> Result<&'data [u8]> {
        section.data(self.data, self.offset)
    }

    /// The contents of a segment.
    pub fn segment_data(&self, segment: &MachOSegment) -> Result<&'data [u8]> {
        segment.data(self.data, self.offset)
    }

    /// The `LC_SYMTAB` fields, if present.
    #[inline]
    pub fn symtab(&self) -> Option<&Symtab> {
        self.symtab.as_ref()
    }

    /// The symbol table.
    ///
    /// An image without `LC_SYMTAB` has an empty table.
    pub fn symbols(&self) -> Result<&SymbolTable<'data, R>> {
        self.symbols
            .get_or_init(|| match &self.symtab {
                Some(symtab) => {
                    if self.header.is_64 {
                        SymbolTable::parse::<macho::Nlist64<Endianness>>(
                            self.data,
                            self.offset,
                            symtab,
                            self.header.endian,
                            &self.sections,
                        )
                    } else {
                        SymbolTable::parse::<macho::Nlist32<Endianness>>(
                            self.data,
                            self.offset,
                            symtab,
                            self.header.endian,
                            &self.sections,
                        )
                    }
                }
                None => Ok(SymbolTable::default()),
            })
            .as_ref()
            .map_err(|error| *error)
    }

    /// The symbol with the given index.
    pub fn symbol_by_index(&self, index: SymbolIndex) -> Result<&MachOSymbol<'data>> {
        self.symbols()?.symbol(index)
    }

    /// The first symbol with the given name.
    pub fn symbol_by_name(&self, name: &[u8]) -> Result<Option<&MachOSymbol<'data>>> {
        Ok(self.symbols()?.symbol_by_name(name))
    }

    /// The dynamic symbol table and its side tables, if `LC_DYSYMTAB` is present.
    pub fn dysymtab(&self) -> Result<Option<&DysymtabTables>> {
        self.dysymtab
            .get_or_init(|| {
                let fields = self.commands.iter().find_map(|command| match command.variant {
                    LoadCommandVariant::Dysymtab(fields) => Some(fields),
                    _ => None,
                });
                match fields {
                    Some(fields) => {
                        let nsyms = self.symtab.map_or(0, |symtab| symtab.nsyms);
                        DysymtabTables::parse(
                            self.data,
                            self.offset,
                            &fields,
                            nsyms,
                            self.header.endian,
                            self.header.is_64,
                        )
                        .map(Some)
                    }
                    None => Ok(None),
                }
            })
            .as_ref()
            .map(Option::as_ref)
            .map_err(|error| *error)
    }

    /// The indirect symbol table.
    pub fn indirect_symbols(&self) -> Result<&[u32]> {
        Ok(match self.dysymtab()? {
            Some(tables) => &tables.indirect_symbols,
            None => &[],
        })
    }

    /// Synthesize `<name>$stub` symbols for the slots of the pointer and
    /// stub sections.
    pub fn stub_symbols(&self) -> Result<Vec<StubSymbol>> {
        match self.dysymtab()? {
            Some(tables) => {
                tables.stub_symbols(&self.sections, self.symbols()?.symbols(), self.header.is_64)
            }
            None => Ok(Vec::new()),
        }
    }

    /// The tables that relocation targets are resolved against.
    pub fn relocation_context(&self) -> RelocationContext<'_> {
        RelocationContext {
            arch: self.arch,
            sections: &self.bounds,
            symbol_count: self.symtab.map_or(0, |symtab| symtab.nsyms as usize),
        }
    }

    /// The raw relocation records of a section.
    pub fn relocation_infos(&self, section: &MachOSection) -> Result<RelocationInfoIterator<'data>> {
        RelocationInfoIterator::new(self.data, self.offset, section, self.header.endian)
    }

    /// The canonical relocations of a section.
    pub fn relocations(&self, section: &MachOSection) -> Result<Vec<Relocation>> {
        relocation::decode_relocations(
            self.data,
            self.offset,
            section.reloff,
            section.nreloc,
            self.header.endian,
            &self.relocation_context(),
        )
    }

    /// The external relocations followed by the local relocations of the
    /// dynamic symbol table.
    pub fn dynamic_relocations(&self) -> Result<&[Relocation]> {
        self.dynamic_relocations
            .get_or_init(|| {
                let fields = match self.dysymtab()? {
                    Some(tables) => tables.fields,
                    None => return Ok(Vec::new()),
                };
                let context = self.relocation_context();
                let mut relocations = relocation::decode_relocations(
                    self.data,
                    self.offset,
                    fields.extreloff,
                    fields.nextrel,
                    self.header.endian,
                    &context,
                )?;
                relocations.extend(relocation::decode_relocations(
                    self.data,
                    self.offset,
                    fields.locreloff,
                    fields.nlocrel,
                    self.header.endian,
                    &context,
                )?);
                Ok(relocations)
            })
            .as_ref()
            .map(Vec::as_slice)
            .map_err(|error| *error)
    }
}
