//! Host-side configuration: defaults spec.md §9 calls out as
//! implementation choices, not wire requirements, gathered into one place
//! so the CLI, the environment variables, and the operations layer agree.

use std::time::Duration;

/// Maximum number of retries for a single `send`, per spec.md §4.4/§7.
pub const DEFAULT_RETRY_COUNT: u8 = 3;

/// Default chunk size for `write`/`upload_elf`, per spec.md §4.5/§9.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Host default initial baud rate, per spec.md §6.
pub const DEFAULT_BAUD: u32 = 19200;

/// Per-attempt read timeout. The spec leaves the exact value to the
/// implementer, recommending 100 ms - 1 s at 19200-115200 baud.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Delay after reconfiguring the host's serial port to a new baud rate,
/// before the confirming ping (spec.md §4.5 `change_speed`, step 3).
pub const SPEED_CHANGE_SETTLE: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct BootloaderConfig {
    pub port: String,
    pub baud: u32,
    pub retry_count: u8,
    pub block_size: usize,
    pub read_timeout: Duration,
    /// When set, `cli` negotiates this speed right after opening the
    /// port, before running the requested command. Populated from
    /// `BOAPROG_SPEED`.
    pub initial_speed_request: Option<u32>,
    /// Trace every raw byte sent/received. Populated from `SHOW_HEX`.
    pub show_hex: bool,
}

impl BootloaderConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: DEFAULT_BAUD,
            retry_count: DEFAULT_RETRY_COUNT,
            block_size: DEFAULT_BLOCK_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            initial_speed_request: Self::env_speed(),
            show_hex: Self::env_show_hex(),
        }
    }

    fn env_speed() -> Option<u32> {
        std::env::var("BOAPROG_SPEED").ok()?.parse().ok()
    }

    fn env_show_hex() -> bool {
        std::env::var("SHOW_HEX").is_ok_and(|v| v != "0")
    }
}
