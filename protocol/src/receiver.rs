//! Byte-oriented receive state machine: `Idle -> Header -> Data|Overflow ->
//! Checksum -> Idle`. Consumes one byte per call; never buffers more than
//! one frame at a time. Shared verbatim between the device firmware and
//! the host transport — only the byte source differs.

use crate::frame::Checksum;
use crate::header::{Header, HEADER_LEN, START_OF_FRAME};
use crate::types::RequestType;
use crate::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Header,
    Data,
    Overflow,
    Checksum,
}

/// Destination for `P_WDATA` payload bytes as they arrive. The device
/// implements this over its memory bus at the pending write address; the
/// host never receives `WDATA` (it only sends it), so `NullSink` is the
/// only implementation it needs.
pub trait PayloadSink {
    fn write(&mut self, offset: usize, byte: u8);
}

/// A sink that discards every byte. Used wherever a packet type other than
/// `WDATA` is being received, or by callers (the host) that never expect a
/// `WDATA` frame at all.
pub struct NullSink;

impl PayloadSink for NullSink {
    fn write(&mut self, _offset: usize, _byte: u8) {}
}

/// The outcome of a completed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEvent {
    /// A frame was received and its checksum validated.
    Packet { ty: u32, length: u32 },
    /// Framing failed: checksum mismatch or over-capacity payload.
    Error(FrameError),
}

/// A fixed-capacity receive state machine. `CAP` bounds the generic
/// payload buffer used for every packet type except `WDATA`, whose bytes
/// are streamed through the caller-supplied [`PayloadSink`] instead and so
/// are not limited by `CAP`.
pub struct Receiver<const CAP: usize> {
    state: State,
    header_buf: [u8; HEADER_LEN],
    header_idx: usize,
    header: Header,
    payload_buf: [u8; CAP],
    payload_idx: usize,
    checksum: Checksum,
    is_wdata: bool,
    overflowed: bool,
}

impl<const CAP: usize> Receiver<CAP> {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            header_buf: [0u8; HEADER_LEN],
            header_idx: 0,
            header: Header::new(0, 0),
            payload_buf: [0u8; CAP],
            payload_idx: 0,
            checksum: Checksum::new(),
            is_wdata: false,
            overflowed: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The header of the frame currently being received or just completed.
    pub fn header(&self) -> Header {
        self.header
    }

    /// The generic payload buffer, valid after a `Packet` event for any
    /// type other than `WDATA` (whose bytes went to the sink instead).
    pub fn payload(&self) -> &[u8] {
        &self.payload_buf[..self.payload_idx.min(CAP)]
    }

    /// Feed one received byte through the state machine. `wdata_sink`
    /// receives the bytes of a `P_WDATA` payload as they arrive; pass
    /// [`NullSink`] when the caller never expects to receive `WDATA`
    /// (i.e. on the host).
    pub fn feed(&mut self, byte: u8, wdata_sink: &mut impl PayloadSink) -> Option<ReceiveEvent> {
        match self.state {
            State::Idle => {
                self.checksum = Checksum::new();
                self.checksum.push(byte);
                if byte == START_OF_FRAME {
                    self.header_idx = 0;
                    self.state = State::Header;
                }
                None
            }
            State::Header => {
                self.header_buf[self.header_idx] = byte;
                self.header_idx += 1;
                self.checksum.push(byte);
                if self.header_idx == HEADER_LEN {
                    self.header = Header::from_bytes(self.header_buf);
                    self.payload_idx = 0;
                    self.is_wdata = self.header.ty == RequestType::Wdata.as_u32();
                    self.overflowed = false;
                    self.state = if self.header.length == 0 {
                        State::Checksum
                    } else if self.is_wdata {
                        State::Data
                    } else if self.header.length as usize > CAP {
                        self.overflowed = true;
                        State::Overflow
                    } else {
                        State::Data
                    };
                }
                None
            }
            State::Data => {
                if self.is_wdata {
                    wdata_sink.write(self.payload_idx, byte);
                } else if self.payload_idx < CAP {
                    self.payload_buf[self.payload_idx] = byte;
                }
                self.payload_idx += 1;
                self.checksum.push(byte);
                if self.payload_idx as u64 == self.header.length as u64 {
                    self.state = State::Checksum;
                }
                None
            }
            State::Overflow => {
                self.checksum.push(byte);
                self.payload_idx += 1;
                if self.payload_idx as u64 == self.header.length as u64 {
                    self.state = State::Checksum;
                }
                None
            }
            State::Checksum => {
                self.state = State::Idle;
                let computed = self.checksum.value();
                if computed != byte {
                    return Some(ReceiveEvent::Error(FrameError::Checksum {
                        received: byte,
                        computed,
                    }));
                }
                if self.overflowed {
                    return Some(ReceiveEvent::Error(FrameError::OverCapacity {
                        length: self.header.length,
                    }));
                }
                Some(ReceiveEvent::Packet {
                    ty: self.header.ty,
                    length: self.header.length,
                })
            }
        }
    }
}

impl<const CAP: usize> Default for Receiver<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
