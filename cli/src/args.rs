//! CLI surface (spec.md §6): the eight subcommands plus the global options
//! needed to actually open a port, none of which the wire spec mandates.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "boaprog", about = "Boa32 serial bootloader client")]
pub struct Cli {
    /// Serial device path, e.g. /dev/ttyUSB0 or COM3.
    #[arg(long, global = true)]
    pub port: String,

    /// Initial baud rate.
    #[arg(long, default_value_t = boaprog_host::config::DEFAULT_BAUD, global = true)]
    pub baud: u32,

    /// Retries per request before giving up.
    #[arg(long, default_value_t = boaprog_host::config::DEFAULT_RETRY_COUNT, global = true)]
    pub retries: u8,

    /// Maximum bytes per WRITE/WDATA chunk.
    #[arg(long, default_value_t = boaprog_host::config::DEFAULT_BLOCK_SIZE, global = true)]
    pub block_size: usize,

    #[command(subcommand)]
    pub command: Command,
}

fn parse_addr(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s.trim_start_matches("0x").trim_start_matches("0X"), 16)
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load an ELF's segments onto the device without running it.
    Upload { file: PathBuf },
    /// Load an ELF's segments and jump to its entry point.
    Run { file: PathBuf },
    /// Send WHO, print the IDENT payload.
    Id,
    /// Random ping, require a byte-identical PONG.
    Ping,
    /// Transfer control to an address without expecting return.
    Jump {
        #[arg(value_parser = parse_addr)]
        addr: u32,
    },
    /// Invoke an address as a function and resume on return.
    Call {
        #[arg(value_parser = parse_addr)]
        addr: u32,
    },
    /// Read device memory; hexdump to stdout or save to a file.
    Read {
        #[arg(value_parser = parse_addr)]
        addr: u32,
        len: u32,
        outfile: Option<PathBuf>,
    },
    /// Write a file's bytes, or a literal number, to device memory.
    Write {
        #[arg(value_parser = parse_addr)]
        addr: u32,
        len: u32,
        source: String,
    },
}
