use boaprog_protocol::types::AddrLenPayload;
use boaprog_protocol::RequestType;

use super::ping::ack_error;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Read `length` bytes starting at `addr` and return them.
pub fn read<S: SerialChannel>(
    transport: &mut Transport<S>,
    addr: u32,
    length: u32,
) -> Result<Vec<u8>, OperationError> {
    let payload = AddrLenPayload { addr, length }.to_bytes();
    let response = transport.send(RequestType::Read.as_u32(), &payload)?;

    if response.ty != RequestType::Rdata.as_u32() {
        if response.ty == RequestType::Ack.as_u32() {
            return Err(ack_error(&response));
        }
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Rdata.as_u32(),
        });
    }

    Ok(response.payload)
}
