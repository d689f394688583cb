use std::thread;

use boaprog_protocol::types::SpeedPayload;
use boaprog_protocol::{AckCode, RequestType};

use super::ping::ping;
use crate::config::SPEED_CHANGE_SETTLE;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Negotiate a new baud rate (spec.md §4.5 `change_speed`): ask the device
/// first, and only reconfigure the host's own port once it has agreed and
/// drained its transmit FIFO. `ACK=NSPEED` is a fail-soft outcome, not an
/// error the caller needs to unwind from differently than any other
/// refusal, so it's still reported via `SpeedRefused`.
pub fn change_speed<S: SerialChannel>(
    transport: &mut Transport<S>,
    bps: u32,
) -> Result<(), OperationError> {
    let payload = SpeedPayload { speed: bps }.to_bytes();
    let response = transport.send(RequestType::Speed.as_u32(), &payload)?;

    if response.ty != RequestType::Ack.as_u32() {
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Ack.as_u32(),
        });
    }

    match response.ack_payload().map(|p| p.ack_type) {
        Some(code) if code == AckCode::Nspeed.as_u8() => return Err(OperationError::SpeedRefused),
        Some(code) if code == AckCode::Ack.as_u8() => {}
        _ => {
            return Err(OperationError::UnexpectedResponse {
                ty: response.ty,
                expected: RequestType::Ack.as_u32(),
            })
        }
    }

    transport.port_mut().drain()?;
    transport.port_mut().set_baud(bps)?;
    thread::sleep(SPEED_CHANGE_SETTLE);

    ping(transport).map_err(|_| OperationError::SpeedChangeLost)
}
