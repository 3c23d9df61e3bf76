use alloc::vec::Vec;
use core::convert::TryFrom;
use core::mem;

#[cfg(feature = "logging")]
use log::debug;

use crate::endian::*;
use crate::macho;
use crate::reloc::RelocationInfo;
use crate::write::string::*;
use crate::write::util::*;
use crate::write::*;

#[derive(Default, Clone, Copy)]
struct SectionOffsets {
    index: usize,
    offset: usize,
    address: u64,
    reloc_offset: usize,
    reloc_count: usize,
    reserved1: u32,
}

#[derive(Default, Clone, Copy)]
struct SymbolOffsets {
    index: usize,
    str_id: Option<StringId>,
}

/// The symbol table group that a symbol is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolGroup {
    Local,
    External,
    Undefined,
}

impl Symbol {
    /// The `n_type` that is written for this symbol.
    pub fn nlist_type(&self) -> u8 {
        if let Some(n_type) = self.n_type {
            return n_type;
        }
        let mut n_type = match self.section {
            SymbolSection::Undefined => macho::N_UNDF,
            SymbolSection::Absolute => macho::N_ABS,
            SymbolSection::Common => macho::N_UNDF | macho::N_EXT,
            SymbolSection::Section(_) => macho::N_SECT,
        };
        if self.global {
            n_type |= macho::N_EXT;
        }
        n_type
    }

    /// The `n_desc` that is written for this symbol.
    pub fn nlist_desc(&self) -> u16 {
        if let Some(n_desc) = self.n_desc {
            return n_desc;
        }
        if !self.weak {
            return 0;
        }
        match self.section {
            SymbolSection::Undefined => macho::N_WEAK_REF,
            SymbolSection::Section(_) => macho::N_WEAK_DEF,
            SymbolSection::Absolute | SymbolSection::Common => 0,
        }
    }

    fn group(&self) -> SymbolGroup {
        let n_type = self.nlist_type();
        if n_type & macho::N_STAB != 0 || n_type & macho::N_EXT == 0 {
            SymbolGroup::Local
        } else {
            match n_type & macho::N_TYPE {
                macho::N_UNDF | macho::N_PBUD => SymbolGroup::Undefined,
                _ => SymbolGroup::External,
            }
        }
    }
}

impl Command {
    fn cmdsize(&self) -> usize {
        match self {
            Command::Uuid(_) => mem::size_of::<macho::UuidCommand<Endianness>>(),
            Command::VersionMin { .. } => mem::size_of::<macho::VersionMinCommand<Endianness>>(),
            Command::SourceVersion(_) => {
                mem::size_of::<macho::SourceVersionCommand<Endianness>>()
            }
            Command::Opaque { data, .. } => 8 + data.len(),
        }
    }

    fn write(&self, buffer: &mut dyn WritableBuffer, endian: Endianness) -> Result<()> {
        let cmdsize = U32::new(endian, self.cmdsize() as u32);
        match *self {
            Command::Uuid(uuid) => buffer.write(&macho::UuidCommand {
                cmd: U32::new(endian, macho::LC_UUID),
                cmdsize,
                uuid,
            }),
            Command::VersionMin { cmd, version, sdk } => buffer.write(&macho::VersionMinCommand {
                cmd: U32::new(endian, cmd),
                cmdsize,
                version: U32::new(endian, version),
                sdk: U32::new(endian, sdk),
            }),
            Command::SourceVersion(version) => buffer.write(&macho::SourceVersionCommand {
                cmd: U32::new(endian, macho::LC_SOURCE_VERSION),
                cmdsize,
                version: U64::new(endian, version),
            }),
            Command::Opaque { cmd, ref data } => {
                buffer.write(&U32::new(endian, cmd));
                buffer.write(&cmdsize);
                buffer.write_bytes(data);
            }
        }
        Ok(())
    }
}

fn name_field(name: &[u8], what: &str) -> Result<[u8; 16]> {
    let mut field = [0; 16];
    field
        .get_mut(..name.len())
        .ok_or_else(|| {
            Error(alloc::format!(
                "{} name `{}` is too long",
                what,
                alloc::string::String::from_utf8_lossy(name)
            ))
        })?
        .copy_from_slice(name);
    Ok(field)
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error(alloc::format!("{} exceeds 32 bits", what)))
}

// Private methods.
impl<'a> Object<'a> {
    pub(crate) fn macho_write(&self, buffer: &mut dyn WritableBuffer) -> Result<()> {
        if self.filetype != macho::MH_OBJECT {
            return Err(Error::not_implemented(format_args!(
                "writing file type {:#x}",
                self.filetype
            )));
        }

        let endian = self.endian;
        let macho32 = MachO32 { endian };
        let macho64 = MachO64 { endian };
        let macho: &dyn MachO = if self.is_64 { &macho64 } else { &macho32 };
        let pointer_align = if self.is_64 { 8 } else { 4 };

        // Assign indirect symbol table ranges.
        let mut section_offsets = alloc::vec![SectionOffsets::default(); self.sections.len()];
        let mut nindirect = 0;
        for (index, section) in self.sections.iter().enumerate() {
            if section.indirect_symbols.is_empty() {
                section_offsets[index].reserved1 = section.reserved1;
            } else {
                section_offsets[index].reserved1 = to_u32(nindirect, "indirect symbol count")?;
                nindirect += section.indirect_symbols.len();
            }
        }
        let has_symtab = !self.symbols.is_empty() || nindirect != 0;

        // Calculate offsets of everything, and build strtab.
        let mut offset = 0;

        // Calculate size of Mach-O header.
        offset += macho.mach_header_size();

        // Calculate size of commands.
        let mut ncmds = 0;
        let command_offset = offset;

        // Calculate size of segment command and section headers.
        let segment_command_offset = offset;
        let segment_command_len =
            macho.segment_command_size() + self.sections.len() * macho.section_header_size();
        offset += segment_command_len;
        ncmds += 1;

        for command in &self.commands {
            offset += command.cmdsize();
            ncmds += 1;
        }

        let symtab_command_offset = offset;
        let symtab_command_len = mem::size_of::<macho::SymtabCommand<Endianness>>();
        let dysymtab_command_len = mem::size_of::<macho::DysymtabCommand<Endianness>>();
        if has_symtab {
            offset += symtab_command_len + dysymtab_command_len;
            ncmds += 2;
        }

        let sizeofcmds = offset - command_offset;

        // Calculate size of section data.
        // Section data immediately follows the load commands.
        let segment_file_offset = offset;
        let mut address = 0;
        for (index, section) in self.sections.iter().enumerate() {
            section_offsets[index].index = 1 + index;
            if !section.is_zerofill() {
                address = align_u64(address, section_alignment(section)?);
                section_offsets[index].address = address;
                section_offsets[index].offset = segment_file_offset + address as usize;
                address += section.data.len() as u64;
            }
        }
        let segment_file_size = address;
        offset += address as usize;
        for (index, section) in self.sections.iter().enumerate() {
            if section.is_zerofill() {
                if !section.data.is_empty() {
                    return Err(Error::new("zerofill section has data"));
                }
                address = align_u64(address, section_alignment(section)?);
                section_offsets[index].address = address;
                address = address
                    .checked_add(section.size)
                    .ok_or_else(|| Error::new("zerofill section is too large"))?;
            }
        }
        if !self.is_64 && address > u64::from(u32::MAX) {
            return Err(Error::new("section addresses exceed 32 bits"));
        }

        // Partition symbols and add symbol strings to strtab.
        let mut strtab = StringTable::default();
        let mut symbol_offsets = alloc::vec![SymbolOffsets::default(); self.symbols.len()];
        let mut local_symbols = Vec::new();
        let mut external_symbols = Vec::new();
        let mut undefined_symbols = Vec::new();
        for (index, symbol) in self.symbols.iter().enumerate() {
            if let SymbolSection::Section(id) = symbol.section {
                if id.0 >= self.sections.len() {
                    return Err(Error(alloc::format!(
                        "symbol `{}` references an invalid section",
                        alloc::string::String::from_utf8_lossy(&symbol.name)
                    )));
                }
            }
            if symbol.name.contains(&0) {
                return Err(Error::new("symbol name contains a NUL byte"));
            }
            if !symbol.name.is_empty() {
                symbol_offsets[index].str_id = Some(strtab.add(&symbol.name));
            }
            match symbol.group() {
                SymbolGroup::Local => local_symbols.push(index),
                SymbolGroup::External => external_symbols.push(index),
                SymbolGroup::Undefined => undefined_symbols.push(index),
            }
        }

        // Stable, so ties keep their input order.
        external_symbols.sort_by_key(|index| &*self.symbols[*index].name);
        undefined_symbols.sort_by_key(|index| &*self.symbols[*index].name);

        // Count symbols.
        let mut nsyms = 0;
        for index in local_symbols
            .iter()
            .copied()
            .chain(external_symbols.iter().copied())
            .chain(undefined_symbols.iter().copied())
        {
            symbol_offsets[index].index = nsyms;
            nsyms += 1;
        }

        // Calculate size of relocations.
        for (index, section) in self.sections.iter().enumerate() {
            let count = section.relocations.len();
            if count != 0 {
                offset = align(offset, 4);
                section_offsets[index].reloc_offset = offset;
                section_offsets[index].reloc_count = count;
                let len = count * mem::size_of::<macho::Relocation<Endianness>>();
                offset += len;
            }
        }

        // Calculate size of indirect symbol table.
        let mut indirect_offset = 0;
        if nindirect != 0 {
            offset = align(offset, 4);
            indirect_offset = offset;
            offset += nindirect * 4;
        }

        // Calculate size of symtab and strtab.
        let mut symtab_offset = 0;
        let mut strtab_offset = 0;
        let mut strtab_data = Vec::new();
        if has_symtab {
            offset = align(offset, pointer_align);
            symtab_offset = offset;
            offset += nsyms * macho.nlist_size();

            strtab_offset = offset;
            // Start with null name.
            strtab_data.push(0);
            strtab.write(1, &mut strtab_data);
            write_align(&mut strtab_data, pointer_align);
            offset += strtab_data.len();
        }
        to_u32(offset, "file size")?;

        #[cfg(feature = "logging")]
        debug!(
            "Mach-O layout: {} commands, {} sections, {} symbols, {} bytes",
            ncmds,
            self.sections.len(),
            nsyms,
            offset
        );

        // Start writing.
        buffer
            .reserve(offset)
            .map_err(|_| Error::new("Cannot allocate buffer"))?;

        // Write file header.
        macho.write_mach_header(
            buffer,
            MachHeader {
                cputype: self.cputype,
                cpusubtype: self.cpusubtype,
                filetype: self.filetype,
                ncmds,
                sizeofcmds: sizeofcmds as u32,
                flags: self.flags,
            },
        );

        // Write segment command.
        debug_assert_eq!(segment_command_offset, buffer.len());
        macho.write_segment_command(
            buffer,
            SegmentCommand {
                cmdsize: segment_command_len as u32,
                segname: [0; 16],
                vmaddr: 0,
                vmsize: address,
                fileoff: segment_file_offset as u64,
                filesize: segment_file_size,
                maxprot: macho::VM_PROT_READ | macho::VM_PROT_WRITE | macho::VM_PROT_EXECUTE,
                initprot: macho::VM_PROT_READ | macho::VM_PROT_WRITE | macho::VM_PROT_EXECUTE,
                nsects: self.sections.len() as u32,
                flags: 0,
            },
        );

        // Write section headers.
        for (index, section) in self.sections.iter().enumerate() {
            let offsets = &section_offsets[index];
            macho.write_section(
                buffer,
                SectionHeader {
                    sectname: name_field(&section.sectname, "section")?,
                    segname: name_field(&section.segname, "segment")?,
                    addr: offsets.address,
                    size: section.len(),
                    offset: offsets.offset as u32,
                    align: section.align,
                    reloff: offsets.reloc_offset as u32,
                    nreloc: offsets.reloc_count as u32,
                    flags: section.flags,
                    reserved1: offsets.reserved1,
                    reserved2: section.reserved2,
                    reserved3: section.reserved3,
                },
            );
        }

        // Write extra commands.
        for command in &self.commands {
            command.write(buffer, endian)?;
        }

        if has_symtab {
            // Write symtab command.
            debug_assert_eq!(symtab_command_offset, buffer.len());
            let symtab_command = macho::SymtabCommand {
                cmd: U32::new(endian, macho::LC_SYMTAB),
                cmdsize: U32::new(endian, symtab_command_len as u32),
                symoff: U32::new(endian, symtab_offset as u32),
                nsyms: U32::new(endian, nsyms as u32),
                stroff: U32::new(endian, strtab_offset as u32),
                strsize: U32::new(endian, strtab_data.len() as u32),
            };
            buffer.write(&symtab_command);

            // Write dysymtab command.
            let nlocal = local_symbols.len() as u32;
            let nextdef = external_symbols.len() as u32;
            let dysymtab_command = macho::DysymtabCommand {
                cmd: U32::new(endian, macho::LC_DYSYMTAB),
                cmdsize: U32::new(endian, dysymtab_command_len as u32),
                ilocalsym: U32::new(endian, 0),
                nlocalsym: U32::new(endian, nlocal),
                iextdefsym: U32::new(endian, nlocal),
                nextdefsym: U32::new(endian, nextdef),
                iundefsym: U32::new(endian, nlocal + nextdef),
                nundefsym: U32::new(endian, undefined_symbols.len() as u32),
                tocoff: U32::default(),
                ntoc: U32::default(),
                modtaboff: U32::default(),
                nmodtab: U32::default(),
                extrefsymoff: U32::default(),
                nextrefsyms: U32::default(),
                indirectsymoff: U32::new(endian, indirect_offset as u32),
                nindirectsyms: U32::new(endian, nindirect as u32),
                extreloff: U32::default(),
                nextrel: U32::default(),
                locreloff: U32::default(),
                nlocrel: U32::default(),
            };
            buffer.write(&dysymtab_command);
        }
        debug_assert_eq!(command_offset + sizeofcmds, buffer.len());

        // Write section data.
        for (index, section) in self.sections.iter().enumerate() {
            if !section.is_zerofill() {
                buffer.resize(section_offsets[index].offset);
                buffer.write_bytes(&section.data);
            }
        }
        debug_assert_eq!(
            segment_file_offset + segment_file_size as usize,
            buffer.len()
        );

        // Write relocations.
        for (index, section) in self.sections.iter().enumerate() {
            if section.relocations.is_empty() {
                continue;
            }
            write_align(buffer, 4);
            debug_assert_eq!(section_offsets[index].reloc_offset, buffer.len());
            for reloc in &section.relocations {
                let info = self.relocation_info(reloc, &section_offsets, &symbol_offsets)?;
                buffer.write(&info.to_raw(endian));
            }
        }

        // Write indirect symbol table.
        if nindirect != 0 {
            write_align(buffer, 4);
            debug_assert_eq!(indirect_offset, buffer.len());
            for section in &self.sections {
                for indirect in &section.indirect_symbols {
                    let value = match *indirect {
                        IndirectSymbol::Symbol(id) => symbol_offsets
                            .get(id.0)
                            .map(|offsets| offsets.index as u32)
                            .ok_or_else(|| {
                                Error::new("indirect symbol references an invalid symbol")
                            })?,
                        IndirectSymbol::Local => macho::INDIRECT_SYMBOL_LOCAL,
                        IndirectSymbol::Absolute => {
                            macho::INDIRECT_SYMBOL_LOCAL | macho::INDIRECT_SYMBOL_ABS
                        }
                        IndirectSymbol::Raw(value) => value,
                    };
                    buffer.write(&U32::new(endian, value));
                }
            }
        }

        if has_symtab {
            // Write symtab.
            write_align(buffer, pointer_align);
            debug_assert_eq!(symtab_offset, buffer.len());
            for index in local_symbols
                .iter()
                .copied()
                .chain(external_symbols.iter().copied())
                .chain(undefined_symbols.iter().copied())
            {
                let symbol = &self.symbols[index];
                let n_sect = match symbol.n_sect {
                    Some(n_sect) => n_sect,
                    None => match symbol.section {
                        SymbolSection::Section(id) => u8::try_from(section_offsets[id.0].index)
                            .map_err(|_| Error::new("symbol section number exceeds 255"))?,
                        _ => macho::NO_SECT,
                    },
                };
                let n_value = match symbol.section {
                    SymbolSection::Section(id) => {
                        section_offsets[id.0].address.wrapping_add(symbol.value)
                    }
                    _ => symbol.value,
                };
                if !self.is_64 && n_value > u64::from(u32::MAX) {
                    return Err(Error::new("symbol value exceeds 32 bits"));
                }
                let n_strx = symbol_offsets[index]
                    .str_id
                    .map(|id| strtab.get_offset(id))
                    .unwrap_or(0);

                macho.write_nlist(
                    buffer,
                    Nlist {
                        n_strx: n_strx as u32,
                        n_type: symbol.nlist_type(),
                        n_sect,
                        n_desc: symbol.nlist_desc(),
                        n_value,
                    },
                );
            }

            // Write strtab.
            debug_assert_eq!(strtab_offset, buffer.len());
            buffer.write_bytes(&strtab_data);
        }

        debug_assert_eq!(offset, buffer.len());

        Ok(())
    }

    fn relocation_info(
        &self,
        reloc: &Relocation,
        section_offsets: &[SectionOffsets],
        symbol_offsets: &[SymbolOffsets],
    ) -> Result<RelocationInfo> {
        let (r_extern, symbolnum) = match reloc.target {
            RelocationTarget::Scattered { value } => {
                if reloc.address > 0x00ff_ffff {
                    return Err(Error::new("scattered relocation address exceeds 24 bits"));
                }
                return Ok(RelocationInfo::scattered(reloc.address, reloc.fields, value));
            }
            RelocationTarget::Symbol(id) => {
                let offsets = symbol_offsets
                    .get(id.0)
                    .ok_or_else(|| Error::new("relocation references an invalid symbol"))?;
                (true, offsets.index as u32)
            }
            RelocationTarget::Section(id) => {
                let offsets = section_offsets
                    .get(id.0)
                    .ok_or_else(|| Error::new("relocation references an invalid section"))?;
                (false, offsets.index as u32)
            }
            RelocationTarget::Absolute => (false, u32::from(macho::R_ABS)),
            RelocationTarget::Raw { r_extern, symbolnum } => (r_extern, symbolnum),
        };
        if symbolnum > 0x00ff_ffff {
            return Err(Error::new("relocation symbol number exceeds 24 bits"));
        }
        Ok(RelocationInfo::plain(
            reloc.address,
            reloc.fields,
            r_extern,
            symbolnum,
        ))
    }
}

fn section_alignment(section: &Section<'_>) -> Result<u64> {
    1u64.checked_shl(section.align)
        .ok_or_else(|| Error::new("section alignment is too large"))
}

struct MachHeader {
    cputype: u32,
    cpusubtype: u32,
    filetype: u32,
    ncmds: u32,
    sizeofcmds: u32,
    flags: u32,
}

struct SegmentCommand {
    cmdsize: u32,
    segname: [u8; 16],
    vmaddr: u64,
    vmsize: u64,
    fileoff: u64,
    filesize: u64,
    maxprot: u32,
    initprot: u32,
    nsects: u32,
    flags: u32,
}

struct SectionHeader {
    sectname: [u8; 16],
    segname: [u8; 16],
    addr: u64,
    size: u64,
    offset: u32,
    align: u32,
    reloff: u32,
    nreloc: u32,
    flags: u32,
    reserved1: u32,
    reserved2: u32,
    reserved3: u32,
}

struct Nlist {
    n_strx: u32,
    n_type: u8,
    n_sect: u8,
    n_desc: u16,
    n_value: u64,
}

trait MachO {
    fn mach_header_size(&self) -> usize;
    fn segment_command_size(&self) -> usize;
    fn section_header_size(&self) -> usize;
    fn nlist_size(&self) -> usize;
    fn write_mach_header(&self, buffer: &mut dyn WritableBuffer, header: MachHeader);
    fn write_segment_command(&self, buffer: &mut dyn WritableBuffer, segment: SegmentCommand);
    fn write_section(&self, buffer: &mut dyn WritableBuffer, section: SectionHeader);
    fn write_nlist(&self, buffer: &mut dyn WritableBuffer, nlist: Nlist);
}

struct MachO32<E> {
    endian: E,
}

impl<E: Endian> MachO for MachO32<E> {
    fn mach_header_size(&self) -> usize {
        mem::size_of::<macho::MachHeader32<E>>()
    }

    fn segment_command_size(&self) -> usize {
        mem::size_of::<macho::SegmentCommand32<E>>()
    }

    fn section_header_size(&self) -> usize {
        mem::size_of::<macho::Section32<E>>()
    }

    fn nlist_size(&self) -> usize {
        mem::size_of::<macho::Nlist32<E>>()
    }

    fn write_mach_header(&self, buffer: &mut dyn WritableBuffer, header: MachHeader) {
        let endian = self.endian;
        let magic = if endian.is_big_endian() {
            macho::MH_MAGIC
        } else {
            macho::MH_CIGAM
        };
        let header = macho::MachHeader32 {
            magic: U32::new(BigEndian, magic),
            cputype: U32::new(endian, header.cputype),
            cpusubtype: U32::new(endian, header.cpusubtype),
            filetype: U32::new(endian, header.filetype),
            ncmds: U32::new(endian, header.ncmds),
            sizeofcmds: U32::new(endian, header.sizeofcmds),
            flags: U32::new(endian, header.flags),
        };
        buffer.write(&header);
    }

    fn write_segment_command(&self, buffer: &mut dyn WritableBuffer, segment: SegmentCommand) {
        let endian = self.endian;
        let segment = macho::SegmentCommand32 {
            cmd: U32::new(endian, macho::LC_SEGMENT),
            cmdsize: U32::new(endian, segment.cmdsize),
            segname: segment.segname,
            vmaddr: U32::new(endian, segment.vmaddr as u32),
            vmsize: U32::new(endian, segment.vmsize as u32),
            fileoff: U32::new(endian, segment.fileoff as u32),
            filesize: U32::new(endian, segment.filesize as u32),
            maxprot: U32::new(endian, segment.maxprot),
            initprot: U32::new(endian, segment.initprot),
            nsects: U32::new(endian, segment.nsects),
            flags: U32::new(endian, segment.flags),
        };
        buffer.write(&segment);
    }

    fn write_section(&self, buffer: &mut dyn WritableBuffer, section: SectionHeader) {
        let endian = self.endian;
        let section = macho::Section32 {
            sectname: section.sectname,
            segname: section.segname,
            addr: U32::new(endian, section.addr as u32),
            size: U32::new(endian, section.size as u32),
            offset: U32::new(endian, section.offset),
            align: U32::new(endian, section.align),
            reloff: U32::new(endian, section.reloff),
            nreloc: U32::new(endian, section.nreloc),
            flags: U32::new(endian, section.flags),
            reserved1: U32::new(endian, section.reserved1),
            reserved2: U32::new(endian, section.reserved2),
        };
        buffer.write(&section);
    }

    fn write_nlist(&self, buffer: &mut dyn WritableBuffer, nlist: Nlist) {
        let endian = self.endian;
        let nlist = macho::Nlist32 {
            n_strx: U32::new(endian, nlist.n_strx),
            n_type: nlist.n_type,
            n_sect: nlist.n_sect,
            n_desc: U16::new(endian, nlist.n_desc),
            n_value: U32::new(endian, nlist.n_value as u32),
        };
        buffer.write(&nlist);
    }
}

struct MachO64<E> {
    endian: E,
}

impl<E: Endian> MachO for MachO64<E> {
    fn mach_header_size(&self) -> usize {
        mem::size_of::<macho::MachHeader64<E>>()
    }

    fn segment_command_size(&self) -> usize {
        mem::size_of::<macho::SegmentCommand64<E>>()
    }

    fn section_header_size(&self) -> usize {
        mem::size_of::<macho::Section64<E>>()
    }

    fn nlist_size(&self) -> usize {
        mem::size_of::<macho::Nlist64<E>>()
    }

    fn write_mach_header(&self, buffer: &mut dyn WritableBuffer, header: MachHeader) {
        let endian = self.endian;
        let magic = if endian.is_big_endian() {
            macho::MH_MAGIC_64
        } else {
            macho::MH_CIGAM_64
        };
        let header = macho::MachHeader64 {
            magic: U32::new(BigEndian, magic),
            cputype: U32::new(endian, header.cputype),
            cpusubtype: U32::new(endian, header.cpusubtype),
            filetype: U32::new(endian, header.filetype),
            ncmds: U32::new(endian, header.ncmds),
            sizeofcmds: U32::new(endian, header.sizeofcmds),
            flags: U32::new(endian, header.flags),
            reserved: U32::default(),
        };
        buffer.write(&header);
    }

    fn write_segment_command(&self, buffer: &mut dyn WritableBuffer, segment: SegmentCommand) {
        let endian = self.endian;
        let segment = macho::SegmentCommand64 {
            cmd: U32::new(endian, macho::LC_SEGMENT_64),
            cmdsize: U32::new(endian, segment.cmdsize),
            segname: segment.segname,
            vmaddr: U64::new(endian, segment.vmaddr),
            vmsize: U64::new(endian, segment.vmsize),
            fileoff: U64::new(endian, segment.fileoff),
            filesize: U64::new(endian, segment.filesize),
            maxprot: U32::new(endian, segment.maxprot),
            initprot: U32::new(endian, segment.initprot),
            nsects: U32::new(endian, segment.nsects),
            flags: U32::new(endian, segment.flags),
        };
        buffer.write(&segment);
    }

    fn write_section(&self, buffer: &mut dyn WritableBuffer, section: SectionHeader) {
        let endian = self.endian;
        let section = macho::Section64 {
            sectname: section.sectname,
            segname: section.segname,
            addr: U64::new(endian, section.addr),
            size: U64::new(endian, section.size),
            offset: U32::new(endian, section.offset),
            align: U32::new(endian, section.align),
            reloff: U32::new(endian, section.reloff),
            nreloc: U32::new(endian, section.nreloc),
            flags: U32::new(endian, section.flags),
            reserved1: U32::new(endian, section.reserved1),
            reserved2: U32::new(endian, section.reserved2),
            reserved3: U32::new(endian, section.reserved3),
        };
        buffer.write(&section);
    }

    fn write_nlist(&self, buffer: &mut dyn WritableBuffer, nlist: Nlist) {
        let endian = self.endian;
        let nlist = macho::Nlist64 {
            n_strx: U32::new(endian, nlist.n_strx),
            n_type: nlist.n_type,
            n_sect: nlist.n_sect,
            n_desc: U16::new(endian, nlist.n_desc),
            n_value: U64::new(endian, nlist.n_value),
        };
        buffer.write(&nlist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SectionFlags;
    use crate::reloc::{RelocationKind, X86_64Reloc};

    fn object() -> Object<'static> {
        Object::new(macho::CPU_TYPE_X86_64, 3, Endianness::Little)
    }

    #[test]
    fn empty_object() {
        let data = object().write().unwrap();
        // Header and a segment command without sections.
        assert_eq!(data.len(), 32 + 72);
        assert_eq!(&data[..4], &[0xcf, 0xfa, 0xed, 0xfe]);
        assert_eq!(u32::from_le_bytes([data[16], data[17], data[18], data[19]]), 1);
    }

    #[test]
    fn symbol_groups() {
        let mut object = object();
        let text = object.add_portable_section(".text", SectionFlags::CODE);
        object.append_section_data(text, &[0x90; 4], 0);
        let names: [(&[u8], SymbolSection, bool); 5] = [
            (b"_zeta", SymbolSection::Section(text), true),
            (b"_undef", SymbolSection::Undefined, true),
            (b"ltmp0", SymbolSection::Section(text), false),
            (b"_alpha", SymbolSection::Section(text), true),
            (b"_common", SymbolSection::Common, true),
        ];
        for (name, section, global) in names.iter().copied() {
            object.add_symbol(Symbol::new(name, section, 0, global));
        }
        let groups: Vec<_> = object.symbols().iter().map(Symbol::group).collect();
        assert_eq!(
            groups,
            [
                SymbolGroup::External,
                SymbolGroup::Undefined,
                SymbolGroup::Local,
                SymbolGroup::External,
                SymbolGroup::Undefined,
            ]
        );
        let stab = Symbol {
            n_type: Some(macho::N_FUN | macho::N_EXT),
            ..Symbol::new(&b"_f"[..], SymbolSection::Section(text), 0, true)
        };
        assert_eq!(stab.group(), SymbolGroup::Local);
    }

    #[test]
    fn weak_desc() {
        let mut symbol = Symbol::new(&b"_w"[..], SymbolSection::Undefined, 0, true);
        symbol.weak = true;
        assert_eq!(symbol.nlist_desc(), macho::N_WEAK_REF);
        symbol.section = SymbolSection::Section(SectionId(0));
        assert_eq!(symbol.nlist_desc(), macho::N_WEAK_DEF);
        symbol.n_desc = Some(0x10);
        assert_eq!(symbol.nlist_desc(), 0x10);
    }

    #[test]
    fn opaque_command() {
        let mut object = object();
        object.commands.push(Command::Opaque {
            cmd: macho::LC_DATA_IN_CODE,
            data: alloc::vec![1, 2, 3, 4, 5, 6, 7, 8],
        });
        let bytes = object.write().unwrap();
        let mut expect = Vec::new();
        expect.extend_from_slice(&macho::LC_DATA_IN_CODE.to_le_bytes());
        expect.extend_from_slice(&16u32.to_le_bytes());
        expect.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(bytes.windows(expect.len()).any(|window| window == &expect[..]));
    }

    #[test]
    fn unsupported_requests() {
        let mut object = self::object();
        object.filetype = macho::MH_DYLIB;
        assert!(object.write().unwrap_err().message().starts_with("not implemented"));

        let mut object = self::object();
        object.add_section(b"__TEXT".to_vec(), b"__a_very_long_section_name".to_vec(), 0);
        assert!(object.write().is_err());
    }

    #[test]
    fn section_layout() {
        let mut object = object();
        let text = object.add_portable_section(".text", SectionFlags::CODE);
        object.set_section_data(text, &[0xc3][..], 0);
        let data = object.add_section(b"__DATA".to_vec(), b"__data".to_vec(), 0);
        object.set_section_data(data, &[1, 2, 3, 4][..], 3);
        let bss = object.add_section(b"__DATA".to_vec(), b"__bss".to_vec(), macho::S_ZEROFILL);
        object.append_zerofill(bss, 0x1_0000_0000, 4);
        let sym = object.add_symbol(Symbol::new(&b"_x"[..], SymbolSection::Section(data), 0, true));
        object
            .add_relocation(
                text,
                Relocation::new(
                    0,
                    RelocationKind::X86_64(X86_64Reloc::Unsigned64),
                    RelocationTarget::Symbol(sym),
                ),
            )
            .unwrap();
        let bytes = object.write().unwrap();
        // Relocations follow the section data at a 4-byte boundary.
        let header_len = 32 + 72 + 3 * 80 + 24 + 80;
        assert_eq!(bytes.len() % 8, 0);
        assert_eq!(bytes[header_len], 0xc3);
        assert_eq!(&bytes[header_len + 8..header_len + 12], &[1, 2, 3, 4]);

        let mut object32 = Object::new(macho::CPU_TYPE_X86, 3, Endianness::Little);
        let bss = object32.add_section(b"__DATA".to_vec(), b"__bss".to_vec(), macho::S_ZEROFILL);
        object32.append_zerofill(bss, 0x1_0000_0000, 0);
        assert!(object32.write().is_err());
    }
}
