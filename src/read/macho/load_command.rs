use alloc::vec::Vec;

#[cfg(feature = "logging")]
use log::warn;

use crate::common::Arch;
use crate::endian::{Endian, Endianness};
use crate::macho;
use crate::pod::{self, Bytes, Pod};
use crate::read::{Error, ReadError, ReadRef, Result, SectionIndex};

use super::{Header, MachHeader, MachOSection, MachOSegment, Segment};

/// A decoded load command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCommand<'data> {
    /// The offset of the command from the start of the image.
    pub offset: u64,
    /// The `cmdsize` of the command.
    pub len: u32,
    /// The command type with `LC_REQ_DYLD` removed.
    pub cmd: u32,
    /// Whether the `LC_REQ_DYLD` bit was set.
    pub required: bool,
    /// The raw bytes of the command, including the 8-byte prefix.
    pub data: &'data [u8],
    /// The decoded command.
    pub variant: LoadCommandVariant<'data>,
}

impl<'data> LoadCommand<'data> {
    /// The command type as stored in the file.
    #[inline]
    pub fn raw_cmd(&self) -> u32 {
        if self.required {
            self.cmd | macho::LC_REQ_DYLD
        } else {
            self.cmd
        }
    }
}

/// The decoded contents of a load command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadCommandVariant<'data> {
    /// `LC_SEGMENT` or `LC_SEGMENT_64`.
    Segment(MachOSegment),
    /// `LC_SYMTAB`.
    Symtab(Symtab),
    /// `LC_DYSYMTAB`.
    Dysymtab(Dysymtab),
    /// `LC_THREAD` or `LC_UNIXTHREAD`.
    Thread(Thread<'data>),
    /// `LC_LOAD_DYLIB`, `LC_LOAD_WEAK_DYLIB`, `LC_REEXPORT_DYLIB`,
    /// `LC_ID_DYLIB`, `LC_LOAD_UPWARD_DYLIB` or `LC_LAZY_LOAD_DYLIB`.
    Dylib(Dylib<'data>),
    /// `LC_LOAD_DYLINKER`, `LC_ID_DYLINKER` or `LC_DYLD_ENVIRONMENT`.
    Dylinker(NamePayload<'data>),
    /// `LC_PREBOUND_DYLIB`.
    PreboundDylib(PreboundDylib<'data>),
    /// `LC_UUID`.
    Uuid([u8; 16]),
    /// `LC_CODE_SIGNATURE`, `LC_SEGMENT_SPLIT_INFO`, `LC_FUNCTION_STARTS`,
    /// `LC_DATA_IN_CODE`, `LC_DYLIB_CODE_SIGN_DRS` or
    /// `LC_LINKER_OPTIMIZATION_HINT`.
    LinkeditData(LinkeditData),
    /// `LC_RPATH`, `LC_SUB_FRAMEWORK`, `LC_SUB_UMBRELLA`, `LC_SUB_LIBRARY`
    /// or `LC_SUB_CLIENT`.
    Str(NamePayload<'data>),
    /// `LC_DYLD_INFO` or `LC_DYLD_INFO_ONLY`.
    DyldInfo(DyldInfo),
    /// `LC_VERSION_MIN_MACOSX`, `LC_VERSION_MIN_IPHONEOS`,
    /// `LC_VERSION_MIN_TVOS` or `LC_VERSION_MIN_WATCHOS`.
    VersionMin(VersionMin),
    /// `LC_MAIN`.
    Main(EntryPoint),
    /// `LC_SOURCE_VERSION`.
    SourceVersion(u64),
    /// `LC_LOADFVMLIB` or `LC_IDFVMLIB`.
    Fvmlib(Fvmlib<'data>),
    /// `LC_ENCRYPTION_INFO` or `LC_ENCRYPTION_INFO_64`.
    EncryptionInfo(EncryptionInfo),
    /// Any other command.
    ///
    /// The raw bytes are available in [`LoadCommand::data`].
    Unknown,
}

/// The fields of `LC_SYMTAB`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Symtab {
    pub symoff: u32,
    pub nsyms: u32,
    pub stroff: u32,
    pub strsize: u32,
}

/// The fields of `LC_DYSYMTAB`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Dysymtab {
    pub ilocalsym: u32,
    pub nlocalsym: u32,
    pub iextdefsym: u32,
    pub nextdefsym: u32,
    pub iundefsym: u32,
    pub nundefsym: u32,
    pub tocoff: u32,
    pub ntoc: u32,
    pub modtaboff: u32,
    pub nmodtab: u32,
    pub extrefsymoff: u32,
    pub nextrefsyms: u32,
    pub indirectsymoff: u32,
    pub nindirectsyms: u32,
    pub extreloff: u32,
    pub nextrel: u32,
    pub locreloff: u32,
    pub nlocrel: u32,
}

impl Dysymtab {
    fn from_raw<E: Endian>(raw: &macho::DysymtabCommand<E>, endian: E) -> Self {
        Dysymtab {
            ilocalsym: raw.ilocalsym.get(endian),
            nlocalsym: raw.nlocalsym.get(endian),
            iextdefsym: raw.iextdefsym.get(endian),
            nextdefsym: raw.nextdefsym.get(endian),
            iundefsym: raw.iundefsym.get(endian),
            nundefsym: raw.nundefsym.get(endian),
            tocoff: raw.tocoff.get(endian),
            ntoc: raw.ntoc.get(endian),
            modtaboff: raw.modtaboff.get(endian),
            nmodtab: raw.nmodtab.get(endian),
            extrefsymoff: raw.extrefsymoff.get(endian),
            nextrefsyms: raw.nextrefsyms.get(endian),
            indirectsymoff: raw.indirectsymoff.get(endian),
            nindirectsyms: raw.nindirectsyms.get(endian),
            extreloff: raw.extreloff.get(endian),
            nextrel: raw.nextrel.get(endian),
            locreloff: raw.locreloff.get(endian),
            nlocrel: raw.nlocrel.get(endian),
        }
    }
}

/// One register state record of a thread command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadState<'data> {
    /// The flavor of the state, such as `x86_THREAD_STATE64`.
    pub flavor: u32,
    /// The number of 32-bit words of state.
    pub count: u32,
    /// The offset of the state from the start of the command.
    pub offset: u32,
    /// The raw register state.
    pub state: &'data [u8],
}

/// The register states of `LC_THREAD` or `LC_UNIXTHREAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread<'data> {
    /// The register states in command order.
    pub states: Vec<ThreadState<'data>>,
}

impl<'data> Thread<'data> {
    /// The initial program counter found in the register state for `arch`.
    pub fn pc(&self, arch: Arch, endian: Endianness) -> Option<u64> {
        // (flavor, register index, register size)
        let (flavor, index, size) = match arch {
            Arch::I386 => (macho::X86_THREAD_STATE32, 10, 4),
            Arch::X86_64 => (macho::X86_THREAD_STATE64, 16, 8),
            Arch::Arm => (macho::ARM_THREAD_STATE, 15, 4),
            Arch::Arm64 => (macho::ARM_THREAD_STATE64, 32, 8),
            Arch::Generic => return None,
        };
        let state = self.states.iter().find(|state| state.flavor == flavor)?;
        let bytes = Bytes(state.state);
        if size == 4 {
            let word = bytes.read_at::<crate::endian::U32<Endianness>>(index * 4).ok()?;
            Some(word.get(endian).into())
        } else {
            let word = bytes.read_at::<crate::endian::U64<Endianness>>(index * 8).ok()?;
            Some(word.get(endian))
        }
    }
}

/// The fields of a dylib command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dylib<'data> {
    /// The library path.
    pub name: &'data [u8],
    /// The offset of the path from the start of the command.
    pub name_offset: u32,
    /// The library build time stamp.
    pub timestamp: u32,
    /// The library's current version number.
    pub current_version: u32,
    /// The library's compatibility version number.
    pub compatibility_version: u32,
}

/// A command whose only payload is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamePayload<'data> {
    /// The string.
    pub name: &'data [u8],
    /// The offset of the string from the start of the command.
    pub name_offset: u32,
}

/// The fields of `LC_PREBOUND_DYLIB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreboundDylib<'data> {
    /// The library path.
    pub name: &'data [u8],
    /// The offset of the path from the start of the command.
    pub name_offset: u32,
    /// The number of modules in the library.
    pub nmodules: u32,
    /// The bit vector of linked modules, one bit per module.
    pub linked_modules: &'data [u8],
    /// The offset of the bit vector from the start of the command.
    pub linked_modules_offset: u32,
}

/// The fields of a linkedit data command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct LinkeditData {
    pub dataoff: u32,
    pub datasize: u32,
}

/// The fields of `LC_DYLD_INFO` and `LC_DYLD_INFO_ONLY`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct DyldInfo {
    pub rebase_off: u32,
    pub rebase_size: u32,
    pub bind_off: u32,
    pub bind_size: u32,
    pub weak_bind_off: u32,
    pub weak_bind_size: u32,
    pub lazy_bind_off: u32,
    pub lazy_bind_size: u32,
    pub export_off: u32,
    pub export_size: u32,
}

/// The fields of a minimum version command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VersionMin {
    /// X.Y.Z encoded in nibbles xxxx.yy.zz.
    pub version: u32,
    /// X.Y.Z encoded in nibbles xxxx.yy.zz.
    pub sdk: u32,
}

/// The fields of `LC_MAIN`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// The file offset of `main()`, relative to the `__TEXT` segment.
    pub entryoff: u64,
    /// The initial stack size, if not zero.
    pub stacksize: u64,
}

/// The fields of a fixed VM shared library command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fvmlib<'data> {
    /// The library path.
    pub name: &'data [u8],
    /// The offset of the path from the start of the command.
    pub name_offset: u32,
    /// The library's minor version number.
    pub minor_version: u32,
    /// The library's header address.
    pub header_addr: u32,
}

/// The fields of `LC_ENCRYPTION_INFO` and `LC_ENCRYPTION_INFO_64`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionInfo {
    /// The file offset of the encrypted range.
    pub cryptoff: u32,
    /// The file size of the encrypted range.
    pub cryptsize: u32,
    /// The encryption system, or zero if not encrypted yet.
    pub cryptid: u32,
    /// The padding word of the 64-bit command.
    pub pad: Option<u32>,
}

/// The state built while scanning the load commands of an image.
#[derive(Debug, Default)]
pub(super) struct CommandTable<'data> {
    pub commands: Vec<LoadCommand<'data>>,
    pub sections: Vec<MachOSection>,
    pub symtab: Option<Symtab>,
    pub dysymtab: Option<Dysymtab>,
}

/// Decode all load commands of an image.
///
/// `offset` is the offset of the image header within `data`.
pub(super) fn parse_commands<'data, Mach, R>(
    data: R,
    offset: u64,
    header: &Header,
    arch: Arch,
) -> Result<CommandTable<'data>>
where
    Mach: MachHeader<Endian = Endianness>,
    R: ReadRef<'data>,
{
    let endian = header.endian;
    let start = offset + header.size();
    let end = start + u64::from(header.sizeofcmds);
    let mut table = CommandTable::default();
    let mut cmd_offset = start;
    for _ in 0..header.ncmds {
        let prefix = data
            .read_at::<macho::LoadCommand<Endianness>>(cmd_offset)
            .read_error("Invalid Mach-O load command header")?;
        let raw_cmd = prefix.cmd.get(endian);
        let cmdsize = prefix.cmdsize.get(endian);
        if cmdsize < 8 {
            return Err(Error("Invalid Mach-O load command size"));
        }
        if cmd_offset + u64::from(cmdsize) > end {
            return Err(Error("Mach-O load command extends past the command area"));
        }
        let cmd_data = data
            .read_bytes_at(cmd_offset, cmdsize.into())
            .read_error("Invalid Mach-O load command size")?;
        let variant = decode_command::<Mach>(cmd_data, raw_cmd, header, arch, &mut table)?;
        #[cfg(feature = "logging")]
        if variant == LoadCommandVariant::Unknown {
            warn!(
                "Unknown Mach-O load command {:#x} at offset {:#x}",
                raw_cmd,
                cmd_offset - offset
            );
        }
        table.commands.push(LoadCommand {
            offset: cmd_offset - offset,
            len: cmdsize,
            cmd: raw_cmd & !macho::LC_REQ_DYLD,
            required: raw_cmd & macho::LC_REQ_DYLD != 0,
            data: cmd_data,
            variant,
        });
        cmd_offset += u64::from(cmdsize);
    }
    if cmd_offset != end {
        return Err(Error("Mach-O sizeofcmds does not match the load commands"));
    }
    Ok(table)
}

fn decode_command<'data, Mach: MachHeader<Endian = Endianness>>(
    cmd_data: &'data [u8],
    raw_cmd: u32,
    header: &Header,
    arch: Arch,
    table: &mut CommandTable<'data>,
) -> Result<LoadCommandVariant<'data>> {
    let endian = header.endian;
    let variant = match raw_cmd {
        macho::LC_SEGMENT | macho::LC_SEGMENT_64 => {
            if (raw_cmd == macho::LC_SEGMENT_64) != header.is_64 {
                return Err(Error("Mach-O segment command does not match the header width"));
            }
            let (segment, sections) = Mach::Segment::parse(endian, cmd_data)?;
            let first = table.sections.len();
            let initprot = segment.initprot(endian);
            for section in sections {
                let index = SectionIndex(table.sections.len() + 1);
                table
                    .sections
                    .push(MachOSection::from_raw(section, endian, arch, index, initprot));
            }
            LoadCommandVariant::Segment(MachOSegment::from_raw(segment, endian, first))
        }
        macho::LC_SYMTAB => {
            if table.symtab.is_some() {
                return Err(Error("Multiple Mach-O LC_SYMTAB commands"));
            }
            let raw = command::<macho::SymtabCommand<Endianness>>(cmd_data)?;
            let symtab = Symtab {
                symoff: raw.symoff.get(endian),
                nsyms: raw.nsyms.get(endian),
                stroff: raw.stroff.get(endian),
                strsize: raw.strsize.get(endian),
            };
            table.symtab = Some(symtab);
            LoadCommandVariant::Symtab(symtab)
        }
        macho::LC_DYSYMTAB => {
            if table.dysymtab.is_some() {
                return Err(Error("Multiple Mach-O LC_DYSYMTAB commands"));
            }
            let raw = command::<macho::DysymtabCommand<Endianness>>(cmd_data)?;
            let dysymtab = Dysymtab::from_raw(raw, endian);
            table.dysymtab = Some(dysymtab);
            LoadCommandVariant::Dysymtab(dysymtab)
        }
        macho::LC_THREAD | macho::LC_UNIXTHREAD => {
            LoadCommandVariant::Thread(parse_thread(cmd_data, endian)?)
        }
        macho::LC_LOAD_DYLIB
        | macho::LC_LOAD_WEAK_DYLIB
        | macho::LC_REEXPORT_DYLIB
        | macho::LC_ID_DYLIB
        | macho::LC_LOAD_UPWARD_DYLIB
        | macho::LC_LAZY_LOAD_DYLIB => {
            let raw = command::<macho::DylibCommand<Endianness>>(cmd_data)?;
            let name_offset = raw.dylib.name.offset.get(endian);
            LoadCommandVariant::Dylib(Dylib {
                name: lc_str(cmd_data, name_offset)?,
                name_offset,
                timestamp: raw.dylib.timestamp.get(endian),
                current_version: raw.dylib.current_version.get(endian),
                compatibility_version: raw.dylib.compatibility_version.get(endian),
            })
        }
        macho::LC_LOAD_DYLINKER | macho::LC_ID_DYLINKER | macho::LC_DYLD_ENVIRONMENT => {
            let raw = command::<macho::DylinkerCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::Dylinker(name_payload(cmd_data, raw.name.offset.get(endian))?)
        }
        macho::LC_PREBOUND_DYLIB => {
            let raw = command::<macho::PreboundDylibCommand<Endianness>>(cmd_data)?;
            let name_offset = raw.name.offset.get(endian);
            let nmodules = raw.nmodules.get(endian);
            let linked_modules_offset = raw.linked_modules.offset.get(endian);
            let linked_modules = Bytes(cmd_data)
                .read_bytes_at(linked_modules_offset as usize, ((nmodules as usize) + 7) / 8)
                .read_error("Invalid Mach-O prebound dylib linked modules")?;
            LoadCommandVariant::PreboundDylib(PreboundDylib {
                name: lc_str(cmd_data, name_offset)?,
                name_offset,
                nmodules,
                linked_modules: linked_modules.0,
                linked_modules_offset,
            })
        }
        macho::LC_UUID => {
            let raw = command::<macho::UuidCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::Uuid(raw.uuid)
        }
        macho::LC_CODE_SIGNATURE
        | macho::LC_SEGMENT_SPLIT_INFO
        | macho::LC_FUNCTION_STARTS
        | macho::LC_DATA_IN_CODE
        | macho::LC_DYLIB_CODE_SIGN_DRS
        | macho::LC_LINKER_OPTIMIZATION_HINT => {
            let raw = command::<macho::LinkeditDataCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::LinkeditData(LinkeditData {
                dataoff: raw.dataoff.get(endian),
                datasize: raw.datasize.get(endian),
            })
        }
        macho::LC_RPATH
        | macho::LC_SUB_FRAMEWORK
        | macho::LC_SUB_UMBRELLA
        | macho::LC_SUB_LIBRARY
        | macho::LC_SUB_CLIENT => {
            let raw = command::<macho::StrCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::Str(name_payload(cmd_data, raw.name.offset.get(endian))?)
        }
        macho::LC_DYLD_INFO | macho::LC_DYLD_INFO_ONLY => {
            let raw = command::<macho::DyldInfoCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::DyldInfo(DyldInfo {
                rebase_off: raw.rebase_off.get(endian),
                rebase_size: raw.rebase_size.get(endian),
                bind_off: raw.bind_off.get(endian),
                bind_size: raw.bind_size.get(endian),
                weak_bind_off: raw.weak_bind_off.get(endian),
                weak_bind_size: raw.weak_bind_size.get(endian),
                lazy_bind_off: raw.lazy_bind_off.get(endian),
                lazy_bind_size: raw.lazy_bind_size.get(endian),
                export_off: raw.export_off.get(endian),
                export_size: raw.export_size.get(endian),
            })
        }
        macho::LC_VERSION_MIN_MACOSX
        | macho::LC_VERSION_MIN_IPHONEOS
        | macho::LC_VERSION_MIN_TVOS
        | macho::LC_VERSION_MIN_WATCHOS => {
            let raw = command::<macho::VersionMinCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::VersionMin(VersionMin {
                version: raw.version.get(endian),
                sdk: raw.sdk.get(endian),
            })
        }
        macho::LC_MAIN => {
            let raw = command::<macho::EntryPointCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::Main(EntryPoint {
                entryoff: raw.entryoff.get(endian),
                stacksize: raw.stacksize.get(endian),
            })
        }
        macho::LC_SOURCE_VERSION => {
            let raw = command::<macho::SourceVersionCommand<Endianness>>(cmd_data)?;
            LoadCommandVariant::SourceVersion(raw.version.get(endian))
        }
        macho::LC_LOADFVMLIB | macho::LC_IDFVMLIB => {
            let raw = command::<macho::FvmlibCommand<Endianness>>(cmd_data)?;
            let name_offset = raw.fvmlib.name.offset.get(endian);
            LoadCommandVariant::Fvmlib(Fvmlib {
                name: lc_str(cmd_data, name_offset)?,
                name_offset,
                minor_version: raw.fvmlib.minor_version.get(endian),
                header_addr: raw.fvmlib.header_addr.get(endian),
            })
        }
        macho::LC_ENCRYPTION_INFO => {
            let raw = command::<macho::EncryptionInfoCommand32<Endianness>>(cmd_data)?;
            LoadCommandVariant::EncryptionInfo(EncryptionInfo {
                cryptoff: raw.cryptoff.get(endian),
                cryptsize: raw.cryptsize.get(endian),
                cryptid: raw.cryptid.get(endian),
                pad: None,
            })
        }
        macho::LC_ENCRYPTION_INFO_64 => {
            let raw = command::<macho::EncryptionInfoCommand64<Endianness>>(cmd_data)?;
            LoadCommandVariant::EncryptionInfo(EncryptionInfo {
                cryptoff: raw.cryptoff.get(endian),
                cryptsize: raw.cryptsize.get(endian),
                cryptid: raw.cryptid.get(endian),
                pad: Some(raw.pad.get(endian)),
            })
        }
        _ => LoadCommandVariant::Unknown,
    };
    Ok(variant)
}

fn command<T: Pod>(cmd_data: &[u8]) -> Result<&T> {
    pod::from_bytes::<T>(cmd_data)
        .map(|(command, _)| command)
        .read_error("Mach-O load command is too small")
}

/// Read an `lc_str` at `offset` from the start of the command.
///
/// The string runs to the first NUL or the end of the command.
fn lc_str(cmd_data: &[u8], offset: u32) -> Result<&[u8]> {
    let bytes = cmd_data
        .get(offset as usize..)
        .read_error("Invalid Mach-O load command string offset")?;
    match memchr::memchr(b'\0', bytes) {
        Some(end) => Ok(&bytes[..end]),
        None => Ok(bytes),
    }
}

fn name_payload(cmd_data: &[u8], name_offset: u32) -> Result<NamePayload<'_>> {
    Ok(NamePayload {
        name: lc_str(cmd_data, name_offset)?,
        name_offset,
    })
}

fn parse_thread(cmd_data: &[u8], endian: Endianness) -> Result<Thread<'_>> {
    let mut bytes = Bytes(cmd_data);
    bytes
        .skip(core::mem::size_of::<macho::ThreadCommand<Endianness>>())
        .read_error("Mach-O thread command is too small")?;
    let mut states = Vec::new();
    while !bytes.is_empty() {
        let offset = (cmd_data.len() - bytes.len()) as u32;
        let header = bytes
            .read::<macho::ThreadStateHeader<Endianness>>()
            .read_error("Invalid Mach-O thread state header")?;
        let count = header.count.get(endian);
        let size = (count as usize)
            .checked_mul(4)
            .read_error("Invalid Mach-O thread state size")?;
        let state = bytes
            .read_bytes(size)
            .read_error("Mach-O thread state extends past the command")?;
        states.push(ThreadState {
            flavor: header.flavor.get(endian),
            count,
            offset: offset + 8,
            state: state.0,
        });
    }
    Ok(Thread { states })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_in_commands() {
        let data = b"\0\0\0\0\0\0\0\0\0\0\0\x0cabc\0def";
        assert_eq!(lc_str(data, 12), Ok(&b"abc"[..]));
        assert_eq!(lc_str(data, 16), Ok(&b"def"[..]));
        assert_eq!(lc_str(data, 19), Ok(&b""[..]));
        assert!(lc_str(data, 20).is_err());
    }

    #[test]
    fn thread_states() {
        let mut data = alloc::vec![0u8; 8];
        // flavor 1, count 2
        data.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0]);
        data.extend_from_slice(&[0xaa; 8]);
        let thread = parse_thread(&data, Endianness::Little).unwrap();
        assert_eq!(thread.states.len(), 1);
        assert_eq!(thread.states[0].flavor, 1);
        assert_eq!(thread.states[0].offset, 16);
        assert_eq!(thread.states[0].state, &[0xaa; 8]);

        // count runs past the end
        data[12] = 3;
        assert!(parse_thread(&data, Endianness::Little).is_err());
    }
}
