//! Request types and ACK codes, tagged 32-bit (resp. 8-bit) values on the
//! wire. Kept as `TryFrom`-checked enums rather than bare constants so a
//! malformed wire value is rejected at the parse boundary instead of
//! propagating as an unchecked integer.

/// Request/response packet type, carried in the frame header's `type` field.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Ping = 0x00,
    Pong = 0x01,
    Ack = 0x02,
    Who = 0x03,
    Ident = 0x04,
    Write = 0x10,
    Read = 0x11,
    Wdata = 0x12,
    Rdata = 0x13,
    Jump = 0x20,
    Call = 0x21,
    /// Baud-rate change. Not fixed by the wire spec; this implementation's
    /// choice, documented in DESIGN.md.
    Speed = 0x22,
}

impl RequestType {
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for RequestType {
    type Error = UnknownRequestType;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Ok(match v {
            0x00 => Self::Ping,
            0x01 => Self::Pong,
            0x02 => Self::Ack,
            0x03 => Self::Who,
            0x04 => Self::Ident,
            0x10 => Self::Write,
            0x11 => Self::Read,
            0x12 => Self::Wdata,
            0x13 => Self::Rdata,
            0x20 => Self::Jump,
            0x21 => Self::Call,
            0x22 => Self::Speed,
            other => return Err(UnknownRequestType(other)),
        })
    }
}

/// Returned when a 32-bit wire value doesn't match any known request type.
/// Not itself a protocol error: the device's dispatcher treats this the
/// same as any other unsupported request (`ACK=NCAP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRequestType(pub u32);

/// Acknowledgement / cause code carried in a `P_ACK` payload's `ack_type`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckCode {
    Ack = 0,
    Nack = 1,
    Xsum = 2,
    Ncap = 3,
    Addr = 4,
    Rdonly = 5,
    Noexec = 6,
    /// Baud-rate change refused. Not fixed by the wire spec; this
    /// implementation's choice, documented in DESIGN.md.
    Nspeed = 7,
}

impl AckCode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AckCode {
    type Error = UnknownAckCode;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Self::Ack,
            1 => Self::Nack,
            2 => Self::Xsum,
            3 => Self::Ncap,
            4 => Self::Addr,
            5 => Self::Rdonly,
            6 => Self::Noexec,
            7 => Self::Nspeed,
            other => return Err(UnknownAckCode(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownAckCode(pub u8);

/// `P_ACK` payload: `{ ack_type: u8, cause: u32 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPayload {
    pub ack_type: u8,
    pub cause: u32,
}

impl AckPayload {
    pub const WIRE_LEN: usize = 5;

    pub const fn new(ack_type: AckCode, cause: u32) -> Self {
        Self {
            ack_type: ack_type.as_u8(),
            cause,
        }
    }

    /// Build the `cause` for an `A_XSUM` ack: low 16 bits are
    /// `(received_sum << 8) | computed_sum`.
    pub const fn xsum_cause(received: u8, computed: u8) -> u32 {
        ((received as u32) << 8) | (computed as u32)
    }

    pub fn to_bytes(self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0] = self.ack_type;
        buf[1..5].copy_from_slice(&self.cause.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::WIRE_LEN {
            return None;
        }
        Some(Self {
            ack_type: buf[0],
            cause: u32::from_le_bytes(buf[1..5].try_into().unwrap()),
        })
    }
}

/// `P_WRITE` / `P_READ` payload: `{ addr: u32, length: u32 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrLenPayload {
    pub addr: u32,
    pub length: u32,
}

impl AddrLenPayload {
    pub const WIRE_LEN: usize = 8;

    pub fn to_bytes(self) -> [u8; Self::WIRE_LEN] {
        let mut buf = [0u8; Self::WIRE_LEN];
        buf[0..4].copy_from_slice(&self.addr.to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::WIRE_LEN {
            return None;
        }
        Some(Self {
            addr: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            length: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        })
    }
}

/// `P_JUMP` / `P_CALL` payload: `{ addr: u32 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrPayload {
    pub addr: u32,
}

impl AddrPayload {
    pub const WIRE_LEN: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::WIRE_LEN] {
        self.addr.to_le_bytes()
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::WIRE_LEN {
            return None;
        }
        Some(Self {
            addr: u32::from_le_bytes(buf.try_into().unwrap()),
        })
    }
}

/// `P_SPEED` payload: `{ speed: u32 }` in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPayload {
    pub speed: u32,
}

impl SpeedPayload {
    pub const WIRE_LEN: usize = 4;

    pub fn to_bytes(self) -> [u8; Self::WIRE_LEN] {
        self.speed.to_le_bytes()
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != Self::WIRE_LEN {
            return None;
        }
        Some(Self {
            speed: u32::from_le_bytes(buf.try_into().unwrap()),
        })
    }
}

/// `P_PING` / `P_PONG` payload: 16 opaque bytes echoed verbatim.
pub const PING_LEN: usize = 16;
