//! Device-side packet server: a byte-oriented receive state machine, a
//! dispatcher for each request, and the memory/control operations backed
//! by the target's registers. Runs in a single-threaded, interrupt-free
//! polling loop — see `server::PacketServer::feed_byte`.

#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod control;
pub mod server;
pub mod uart;

pub use bus::{BusError, MemoryBus};
pub use control::ControlOps;
pub use server::PacketServer;
pub use uart::Uart;
