//! Host-side error taxonomy (spec.md §7): transport failures and the
//! operation-level refusals the device can ack with.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response within the per-attempt timeout")]
    Timeout,

    #[error("malformed response frame: {0}")]
    Framing(#[from] boaprog_protocol::FrameError),

    #[error("retries exhausted after {0} attempts")]
    RetriesExhausted(u8),

    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("device replied with unexpected packet type {ty:#x}, expected {expected:#x}")]
    UnexpectedResponse { ty: u32, expected: u32 },

    #[error("device refused the request: {0:?}")]
    Refused(boaprog_protocol::AckCode),

    #[error("ping response did not match the nonce")]
    PingMismatch,

    #[error("device's baud-rate change was refused; staying at the current rate")]
    SpeedRefused,

    #[error("device did not respond after the baud-rate change")]
    SpeedChangeLost,

    #[error(transparent)]
    Elf(#[from] boaprog_elf_loader::ElfError),
}
