//! Frame header: `{ type: u32, length: u32 }`, little-endian on the wire.

/// First byte of every frame.
pub const START_OF_FRAME: u8 = 0x02;

/// On-wire size of [`Header`] in bytes.
pub const HEADER_LEN: usize = 8;

/// The fixed-size header that precedes every frame's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub ty: u32,
    pub length: u32,
}

impl Header {
    pub const fn new(ty: u32, length: u32) -> Self {
        Self { ty, length }
    }

    /// Serialize to the 8-byte little-endian wire representation.
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.ty.to_le_bytes());
        buf[4..8].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Parse from the 8-byte little-endian wire representation.
    pub fn from_bytes(buf: [u8; HEADER_LEN]) -> Self {
        let ty = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let length = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        Self { ty, length }
    }
}
