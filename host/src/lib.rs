//! Host-side packet client: serial port ownership, framing, bounded retry,
//! and the user-visible operations built on top of it.

pub mod config;
pub mod error;
pub mod ops;
pub mod serial;
pub mod transport;

pub use config::BootloaderConfig;
pub use error::{OperationError, TransportError};
pub use serial::SerialChannel;
pub use transport::{Packet, Transport};
