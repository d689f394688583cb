//! UART transport: a blocking byte-at-a-time transmit helper spinning on
//! the TX-ready flag, and a clock divider the dispatcher reprograms after
//! a successful `P_SPEED`. Register layout is this implementation's own —
//! the spec leaves the peripheral itself out of scope, specifying only
//! "a byte-at-a-time serial transport with a configurable clock divider".

/// Line-status bits, loosely mirroring the polling idiom of a 16550-style
/// UART (TX-ready / TX-FIFO-empty flags) but addressed as a single
/// memory-mapped register block instead of indexed I/O ports, since the
/// target is a RISC-V soft-core rather than x86.
const STATUS_RX_READY: u32 = 1 << 0;
const STATUS_TX_READY: u32 = 1 << 1;
const STATUS_TX_EMPTY: u32 = 1 << 2;

#[repr(C)]
pub struct UartRegs {
    /// Write: enqueue one byte for transmission. Read: dequeue one
    /// received byte. Only the low 8 bits are meaningful either way.
    pub fifo: u32,
    pub status: u32,
    pub divider: u32,
}

pub trait Uart {
    fn write_byte(&mut self, byte: u8);
    fn read_byte(&mut self) -> Option<u8>;
    /// Block until the transmit FIFO has fully drained.
    fn drain_tx(&mut self);
    fn set_divider(&mut self, divider: u16);
}

/// A [`Uart`] backed by a memory-mapped [`UartRegs`] block.
pub struct MmioUart {
    regs: *mut UartRegs,
}

impl MmioUart {
    /// # Safety
    ///
    /// `base` must point to a valid `UartRegs` block, mapped for the
    /// entire lifetime of the returned handle, with no other aliasing
    /// writer.
    pub unsafe fn new(base: *mut UartRegs) -> Self {
        Self { regs: base }
    }

    fn status(&self) -> u32 {
        unsafe { core::ptr::read_volatile(&raw const (*self.regs).status) }
    }
}

impl Uart for MmioUart {
    fn write_byte(&mut self, byte: u8) {
        while self.status() & STATUS_TX_READY == 0 {
            core::hint::spin_loop();
        }
        unsafe { core::ptr::write_volatile(&raw mut (*self.regs).fifo, byte as u32) };
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.status() & STATUS_RX_READY == 0 {
            return None;
        }
        let byte = unsafe { core::ptr::read_volatile(&raw const (*self.regs).fifo) };
        Some(byte as u8)
    }

    fn drain_tx(&mut self) {
        while self.status() & STATUS_TX_EMPTY == 0 {
            core::hint::spin_loop();
        }
    }

    fn set_divider(&mut self, divider: u16) {
        unsafe { core::ptr::write_volatile(&raw mut (*self.regs).divider, divider as u32) };
    }
}

/// An in-memory [`Uart`] double for tests: captures every transmitted
/// byte and is fed received bytes from a preloaded queue.
#[cfg(test)]
pub struct LoopbackUart {
    pub tx: std::vec::Vec<u8>,
    pub rx: std::collections::VecDeque<u8>,
    pub divider: u16,
}

#[cfg(test)]
impl LoopbackUart {
    pub fn new() -> Self {
        Self {
            tx: std::vec::Vec::new(),
            rx: std::collections::VecDeque::new(),
            divider: 0,
        }
    }
}

#[cfg(test)]
impl Uart for LoopbackUart {
    fn write_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn drain_tx(&mut self) {}

    fn set_divider(&mut self, divider: u16) {
        self.divider = divider;
    }
}
