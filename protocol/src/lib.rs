//! Wire protocol shared by the device-side packet server and the host-side
//! packet client: frame layout, checksum, and the byte-oriented receive
//! state machine. Carries no knowledge of serial ports, memory maps, or
//! ELF files — those live in the `device`, `host`, and `elf-loader` crates.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod error;
pub mod frame;
pub mod header;
pub mod receiver;
pub mod types;

pub use error::FrameError;
pub use frame::{encode_frame, FrameSink};
pub use header::{Header, HEADER_LEN, START_OF_FRAME};
pub use receiver::{NullSink, PayloadSink, ReceiveEvent, Receiver, State};
pub use types::{AckCode, RequestType};

/// Default device-advertised maximum payload size for non-`WDATA` packets.
pub const DATA_MAX: usize = 4096;
