//! Frame-level errors. Kept dependency-free (no `thiserror`) since this
//! crate is `no_std` and shared with the device firmware; `host` wraps
//! these into its own `thiserror`-derived error enum at the std boundary.

use core::fmt;

/// A framing-level failure: checksum mismatch or over-capacity payload.
/// Distinct from an operation-level failure (e.g. an `ACK=NACK`), which is
/// a successfully-received packet whose *contents* indicate refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The trailing checksum byte didn't match the accumulated sum.
    Checksum { received: u8, computed: u8 },
    /// A non-`WDATA` packet declared a length greater than the receiver's
    /// capacity.
    OverCapacity { length: u32 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Checksum { received, computed } => write!(
                f,
                "checksum mismatch: received 0x{received:02x}, computed 0x{computed:02x}"
            ),
            FrameError::OverCapacity { length } => {
                write!(f, "payload length {length} exceeds receiver capacity")
            }
        }
    }
}

impl core::error::Error for FrameError {}
