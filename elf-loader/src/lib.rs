//! The "external ELF provider" spec.md §6 treats as an out-of-scope
//! collaborator: `open`/`load`/`segments`/`entrypoint`/`close_instance`/
//! `close_file`, backed by `goblin` so this workspace never has to carry
//! its own ELF format knowledge. Everything beyond segment iteration and
//! entry-point resolution (relocations, symbol tables, sections) is
//! deliberately untouched.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

pub use error::ElfError;

/// One loadable segment, already resolved to a device-address / byte-slice
/// pair. `vaddr` is where the device should be told to place `bytes`
/// (`host::ops::write`'s `addr`); `bytes.len()` is the size the spec's
/// contract calls out separately, here implicit in the `Vec`.
#[derive(Debug, Clone)]
pub struct Segment {
    pub vaddr: u32,
    pub bytes: Vec<u8>,
}

/// An opened, unparsed ELF file. Kept as raw bytes until `load` because
/// `goblin::elf::Elf` borrows from the buffer it parses.
pub struct ElfFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl ElfFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path).map_err(|source| ElfError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { path, bytes })
    }

    /// Resolve loadable segments and the entry point into a host-side
    /// shadow that no longer needs the original file.
    pub fn load(&self) -> Result<ElfInstance, ElfError> {
        let elf = goblin::elf::Elf::parse(&self.bytes)?;

        let entry = u32::try_from(elf.entry).map_err(|_| ElfError::AddressOutOfRange {
            field: "entry",
            value: elf.entry,
        })?;

        let mut segments = Vec::new();
        for ph in elf.program_headers.iter().filter(|ph| ph.p_type == goblin::elf::program_header::PT_LOAD) {
            let vaddr = u32::try_from(ph.p_vaddr).map_err(|_| ElfError::AddressOutOfRange {
                field: "p_vaddr",
                value: ph.p_vaddr,
            })?;
            let start = ph.p_offset as usize;
            let end = start + ph.p_filesz as usize;
            let bytes = self
                .bytes
                .get(start..end)
                .ok_or(ElfError::AddressOutOfRange {
                    field: "p_offset+p_filesz",
                    value: ph.p_offset + ph.p_filesz,
                })?
                .to_vec();

            log::debug!(
                "segment vaddr={vaddr:#x} filesz={} memsz={}",
                ph.p_filesz,
                ph.p_memsz
            );
            segments.push(Segment { vaddr, bytes });
        }

        Ok(ElfInstance { entry, segments })
    }

    /// Symmetric with `open`; the file's resources are really just the
    /// `Vec<u8>` buffer, but this keeps the lifecycle explicit the way the
    /// contract names it.
    pub fn close_file(self) {
        log::trace!("closed {}", self.path.display());
    }
}

/// A loaded ELF: resolved segments plus entry point, detached from the
/// source file.
pub struct ElfInstance {
    entry: u32,
    segments: Vec<Segment>,
}

impl ElfInstance {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn entrypoint(&self) -> u32 {
        self.entry
    }

    pub fn close_instance(self) {
        log::trace!("closed ELF instance, entry={:#x}", self.entry);
    }
}
