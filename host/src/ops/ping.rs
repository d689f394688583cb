use boaprog_protocol::types::PING_LEN;
use boaprog_protocol::{AckCode, RequestType};
use rand::RngCore;

use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::{Packet, Transport};

/// Send a 16-byte random nonce and require it echoed back byte-identical.
pub fn ping<S: SerialChannel>(transport: &mut Transport<S>) -> Result<(), OperationError> {
    let mut nonce = [0u8; PING_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let response = transport.send(RequestType::Ping.as_u32(), &nonce)?;

    if response.ty != RequestType::Pong.as_u32() {
        if response.ty == RequestType::Ack.as_u32() {
            return Err(ack_error(&response));
        }
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Pong.as_u32(),
        });
    }

    if response.payload != nonce {
        return Err(OperationError::PingMismatch);
    }

    Ok(())
}

/// Translate an `ACK` packet carrying a non-`ACK` cause into the matching
/// `OperationError::Refused`, for ops that expect a different response type
/// on success but may instead see a refusal.
pub(super) fn ack_error(packet: &Packet) -> OperationError {
    match packet.ack_payload().and_then(|p| AckCode::try_from(p.ack_type).ok()) {
        Some(code) => OperationError::Refused(code),
        None => OperationError::UnexpectedResponse {
            ty: packet.ty,
            expected: RequestType::Ack.as_u32(),
        },
    }
}
