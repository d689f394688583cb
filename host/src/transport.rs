//! `send(header, payload) -> Result<Packet, TransportError>` with bounded
//! retry (spec.md §4.4): stop-and-wait, retry on timeout or on the device
//! reporting our transmission was corrupt, surface anything else.

use boaprog_protocol::{
    types::AckPayload, AckCode, Header, NullSink, ReceiveEvent, Receiver, RequestType, DATA_MAX,
};

use crate::config::BootloaderConfig;
use crate::error::TransportError;
use crate::serial::SerialChannel;

/// A received, checksum-validated packet with its payload copied out of
/// the receive state machine's scratch buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ty: u32,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn is_ack(&self, code: AckCode) -> bool {
        self.ty == RequestType::Ack.as_u32()
            && AckPayload::from_bytes(&self.payload).is_some_and(|ack| ack.ack_type == code.as_u8())
    }

    pub fn ack_payload(&self) -> Option<AckPayload> {
        if self.ty != RequestType::Ack.as_u32() {
            return None;
        }
        AckPayload::from_bytes(&self.payload)
    }
}

/// Renders `bytes` as a space-separated hex string for `SHOW_HEX` tracing
/// (spec.md §6).
fn hex_trace(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

pub struct Transport<S: SerialChannel> {
    port: S,
    retry_count: u8,
    show_hex: bool,
    last_outgoing_frame: Vec<u8>,
}

impl<S: SerialChannel> Drop for Transport<S> {
    /// The host owns the serial port exclusively (spec.md §5); dropping the
    /// `Transport` on every exit path (normal return, `?`, panic unwind) is
    /// what restores the OS's terminal/port state, since `S`'s own `Drop`
    /// (e.g. `serialport`'s handle) runs right after this.
    fn drop(&mut self) {
        log::debug!("closing serial port");
    }
}

impl<S: SerialChannel> Transport<S> {
    pub fn new(port: S, config: &BootloaderConfig) -> Self {
        Self {
            port,
            retry_count: config.retry_count,
            show_hex: config.show_hex,
            last_outgoing_frame: Vec::new(),
        }
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Send one request and return its response, retrying on timeout or a
    /// reported checksum failure up to `retry_count` times.
    pub fn send(&mut self, ty: u32, payload: &[u8]) -> Result<Packet, TransportError> {
        for attempt in 0..=self.retry_count {
            if attempt > 0 {
                log::warn!("retry {attempt}/{}", self.retry_count);
            }

            self.write_frame(ty, payload)?;

            match self.await_response() {
                Ok(packet) if packet.is_ack(AckCode::Xsum) => {
                    log::debug!("device reported a corrupt request, retrying");
                    continue;
                }
                Ok(packet) => return Ok(packet),
                Err(TransportError::Timeout) | Err(TransportError::Framing(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.dump_diagnostic();
        Err(TransportError::RetriesExhausted(self.retry_count))
    }

    fn write_frame(&mut self, ty: u32, payload: &[u8]) -> Result<(), TransportError> {
        let mut frame = Vec::with_capacity(boaprog_protocol::frame::encoded_len(payload.len()));
        boaprog_protocol::encode_frame(Header::new(ty, payload.len() as u32), payload, &mut frame);
        if self.show_hex {
            log::trace!("-> {}", hex_trace(&frame));
        }
        self.port.write_all(&frame)?;
        self.last_outgoing_frame = frame;
        Ok(())
    }

    fn await_response(&mut self) -> Result<Packet, TransportError> {
        let mut receiver = Receiver::<DATA_MAX>::new();
        let mut raw = Vec::new();
        loop {
            let byte = match self.port.read_byte_with_timeout()? {
                Some(b) => b,
                None => return Err(TransportError::Timeout),
            };
            if self.show_hex {
                raw.push(byte);
            }
            match receiver.feed(byte, &mut NullSink) {
                Some(ReceiveEvent::Packet { ty, .. }) => {
                    if self.show_hex {
                        log::trace!("<- {}", hex_trace(&raw));
                    }
                    return Ok(Packet {
                        ty,
                        payload: receiver.payload().to_vec(),
                    });
                }
                Some(ReceiveEvent::Error(e)) => {
                    if self.show_hex {
                        log::trace!("<- {}", hex_trace(&raw));
                    }
                    log::debug!("frame error while awaiting response: {e}");
                    return Err(TransportError::Framing(e));
                }
                None => continue,
            }
        }
    }

    fn dump_diagnostic(&self) {
        if self.last_outgoing_frame.is_empty() {
            return;
        }
        let path = std::env::temp_dir().join("boaprog-last-frame.bin");
        if let Err(e) = std::fs::write(&path, &self.last_outgoing_frame) {
            log::warn!("failed to write diagnostic frame dump to {path:?}: {e}");
        } else {
            log::info!("retries exhausted; last outgoing frame dumped to {path:?}");
        }
    }
}
