use boaprog_protocol::types::AddrPayload;
use boaprog_protocol::{AckCode, RequestType};

use super::ping::ack_error;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Transfer control to `addr` without expecting return. The device still
/// ACKs before transferring, so this returns once that ACK is observed.
pub fn jump<S: SerialChannel>(transport: &mut Transport<S>, addr: u32) -> Result<(), OperationError> {
    require_ack(transport, RequestType::Jump, addr)
}

/// Invoke `addr` as a function and expect the device to resume afterward.
pub fn call<S: SerialChannel>(transport: &mut Transport<S>, addr: u32) -> Result<(), OperationError> {
    require_ack(transport, RequestType::Call, addr)
}

fn require_ack<S: SerialChannel>(
    transport: &mut Transport<S>,
    ty: RequestType,
    addr: u32,
) -> Result<(), OperationError> {
    let payload = AddrPayload { addr }.to_bytes();
    let response = transport.send(ty.as_u32(), &payload)?;

    if response.ty != RequestType::Ack.as_u32() {
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Ack.as_u32(),
        });
    }

    match response.ack_payload().map(|p| p.ack_type) {
        Some(code) if code == AckCode::Ack.as_u8() => Ok(()),
        _ => Err(ack_error(&response)),
    }
}
