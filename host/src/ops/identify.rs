use boaprog_protocol::RequestType;

use super::ping::ack_error;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Send `WHO`, require an `IDENT` response, and return its payload decoded
/// as UTF-8 (the identity string's grammar is informal; this crate only
/// guarantees transport of opaque text, per spec.md §9).
pub fn identify<S: SerialChannel>(transport: &mut Transport<S>) -> Result<String, OperationError> {
    let response = transport.send(RequestType::Who.as_u32(), &[])?;

    if response.ty != RequestType::Ident.as_u32() {
        if response.ty == RequestType::Ack.as_u32() {
            return Err(ack_error(&response));
        }
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Ident.as_u32(),
        });
    }

    Ok(String::from_utf8_lossy(&response.payload).into_owned())
}
