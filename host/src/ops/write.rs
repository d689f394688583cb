use boaprog_protocol::types::AddrLenPayload;
use boaprog_protocol::{AckCode, RequestType};

use super::ping::ack_error;
use crate::config::BootloaderConfig;
use crate::error::OperationError;
use crate::serial::SerialChannel;
use crate::transport::Transport;

/// Chop `bytes` into chunks of at most `config.block_size` and write each
/// as a `WRITE`+`WDATA` pair (spec.md §4.5, P6). The number of pairs sent
/// is `ceil(bytes.len() / block_size)`, matching a single monolithic write
/// chunk-for-chunk regardless of block size.
pub fn write<S: SerialChannel>(
    transport: &mut Transport<S>,
    config: &BootloaderConfig,
    addr: u32,
    bytes: &[u8],
) -> Result<(), OperationError> {
    let block_size = config.block_size.max(1);

    for (offset, chunk) in bytes.chunks(block_size).enumerate() {
        let chunk_addr = addr.wrapping_add((offset * block_size) as u32);
        write_chunk(transport, chunk_addr, chunk)?;
    }

    Ok(())
}

fn write_chunk<S: SerialChannel>(
    transport: &mut Transport<S>,
    addr: u32,
    chunk: &[u8],
) -> Result<(), OperationError> {
    let header_payload = AddrLenPayload {
        addr,
        length: chunk.len() as u32,
    }
    .to_bytes();
    let response = transport.send(RequestType::Write.as_u32(), &header_payload)?;
    require_ack(&response)?;

    let response = transport.send(RequestType::Wdata.as_u32(), chunk)?;
    require_ack(&response)
}

fn require_ack(response: &crate::transport::Packet) -> Result<(), OperationError> {
    if response.ty != RequestType::Ack.as_u32() {
        return Err(OperationError::UnexpectedResponse {
            ty: response.ty,
            expected: RequestType::Ack.as_u32(),
        });
    }
    match response.ack_payload().map(|p| p.ack_type) {
        Some(code) if code == AckCode::Ack.as_u8() => Ok(()),
        _ => Err(ack_error(response)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::LoopbackChannel;
    use boaprog_protocol::types::AckPayload;
    use boaprog_protocol::Header;

    fn ack_frame() -> Vec<u8> {
        let mut buf = Vec::new();
        boaprog_protocol::encode_frame(
            Header::new(RequestType::Ack.as_u32(), AckPayload::WIRE_LEN as u32),
            &AckPayload::new(AckCode::Ack, 0).to_bytes(),
            &mut buf,
        );
        buf
    }

    #[test]
    fn chunks_at_the_configured_block_size() {
        let mut channel = LoopbackChannel::new(19200);
        let data = vec![0xAAu8; 3000];
        let mut config = BootloaderConfig::new("/dev/null");
        config.block_size = 1024;

        // Three chunks (1024, 1024, 952) -> six ACKs (WRITE then WDATA per
        // chunk).
        for _ in 0..6 {
            channel.push_rx(&ack_frame());
        }
        let mut transport = Transport::new(channel, &config);

        write(&mut transport, &config, 0x8000_1000, &data).unwrap();
    }

    #[test]
    fn propagates_a_refusal_from_any_chunk() {
        let mut channel = LoopbackChannel::new(19200);
        channel.push_rx(&ack_frame());
        let mut refusal = Vec::new();
        boaprog_protocol::encode_frame(
            Header::new(RequestType::Ack.as_u32(), AckPayload::WIRE_LEN as u32),
            &AckPayload::new(AckCode::Addr, 0).to_bytes(),
            &mut refusal,
        );
        channel.push_rx(&refusal);
        let config = BootloaderConfig::new("/dev/null");
        let mut transport = Transport::new(channel, &config);

        let err = write(&mut transport, &config, 0x8000_1000, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, OperationError::Refused(AckCode::Addr)));
    }
}
