//! Command-line surface over `boaprog-host`'s operations (spec.md §6).

mod args;
mod hexdump;

use anyhow::{bail, Context, Result};
use clap::Parser;

use args::{Cli, Command};
use boaprog_host::config::{BootloaderConfig, DEFAULT_READ_TIMEOUT};
use boaprog_host::serial::HostSerialPort;
use boaprog_host::{ops, Transport};

fn main() -> Result<()> {
    env_logger::init();

    if let Err(e) = run() {
        for cause in e.chain() {
            eprintln!("error: {cause}");
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BootloaderConfig::new(cli.port.clone());
    config.baud = cli.baud;
    config.retry_count = cli.retries;
    config.block_size = cli.block_size;

    let port = HostSerialPort::open(&config.port, config.baud, DEFAULT_READ_TIMEOUT)
        .with_context(|| format!("failed to open {}", config.port))?;
    let mut transport = Transport::new(port, &config);

    if let Some(bps) = config.initial_speed_request {
        ops::change_speed(&mut transport, bps).context("initial SPEED negotiation failed")?;
    }

    match cli.command {
        Command::Upload { file } => {
            ops::upload_elf(&mut transport, &config, &file, false).context("upload failed")?;
            println!("uploaded {}", file.display());
        }
        Command::Run { file } => {
            ops::upload_elf(&mut transport, &config, &file, true).context("upload+run failed")?;
            println!("ran {}", file.display());
        }
        Command::Id => {
            let ident = ops::identify(&mut transport).context("identify failed")?;
            println!("{ident}");
        }
        Command::Ping => {
            ops::ping(&mut transport).context("ping failed")?;
            println!("pong");
        }
        Command::Jump { addr } => {
            ops::jump(&mut transport, addr).context("jump failed")?;
            println!("jumped to {addr:#010x}");
        }
        Command::Call { addr } => {
            ops::call(&mut transport, addr).context("call failed")?;
            println!("called {addr:#010x} and returned");
        }
        Command::Read { addr, len, outfile } => {
            let bytes = ops::read(&mut transport, addr, len).context("read failed")?;
            match outfile {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => print!("{}", hexdump::dump(addr, &bytes)),
            }
        }
        Command::Write { addr, len, source } => {
            let bytes = resolve_write_source(&source, len)?;
            ops::write(&mut transport, &config, addr, &bytes).context("write failed")?;
            println!("wrote {} bytes to {addr:#010x}", bytes.len());
        }
    }

    Ok(())
}

/// A `write` source is either a literal number (decimal or `0x`-prefixed
/// hex), little-endian encoded and sized to `len`, or a file path whose
/// bytes are truncated or zero-padded to `len`.
fn resolve_write_source(source: &str, len: u32) -> Result<Vec<u8>> {
    if len == 0 {
        bail!("write length must be nonzero");
    }
    let len = len as usize;

    if let Some(value) = parse_literal(source) {
        let mut bytes = value.to_le_bytes().to_vec();
        bytes.resize(len, 0);
        return Ok(bytes);
    }

    let mut bytes = std::fs::read(source).with_context(|| format!("failed to read {source}"))?;
    if bytes.len() > len {
        bytes.truncate(len);
    } else {
        bytes.resize(len, 0);
    }
    Ok(bytes)
}

fn parse_literal(source: &str) -> Option<u64> {
    if let Some(hex) = source.strip_prefix("0x").or_else(|| source.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    source.parse::<u64>().ok()
}
