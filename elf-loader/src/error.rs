//! Errors surfaced by the loader glue (spec.md §7): file I/O at `open`,
//! malformed ELF at `load`, and the one loader-specific check — a segment
//! or entry point that doesn't fit the device's 32-bit address space.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElfError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ELF: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("{field} value {value:#x} does not fit in a 32-bit device address")]
    AddressOutOfRange { field: &'static str, value: u64 },
}
