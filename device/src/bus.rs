//! The device's flat addressable physical memory. Out of scope per the
//! spec beyond "a flat addressable physical memory" — this trait is the
//! seam the packet server talks through; a real firmware build backs it
//! with the RISC-V core's memory map, tests back it with a plain slice.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    OutOfRange,
}

pub trait MemoryBus {
    fn write_byte(&mut self, addr: u32, byte: u8) -> Result<(), BusError>;
    fn read(&self, addr: u32, out: &mut [u8]) -> Result<(), BusError>;
}

/// A `MemoryBus` backed by a fixed region of host memory, addressed
/// relative to `base`. Used by firmware builds with a statically-linked
/// SRAM region and by tests exercising P5/S2 without real hardware.
pub struct SliceBus<'a> {
    base: u32,
    region: &'a mut [u8],
}

impl<'a> SliceBus<'a> {
    pub fn new(base: u32, region: &'a mut [u8]) -> Self {
        Self { base, region }
    }

    fn offset(&self, addr: u32) -> Option<usize> {
        addr.checked_sub(self.base).map(|o| o as usize)
    }
}

impl<'a> MemoryBus for SliceBus<'a> {
    fn write_byte(&mut self, addr: u32, byte: u8) -> Result<(), BusError> {
        let offset = self.offset(addr).ok_or(BusError::OutOfRange)?;
        let slot = self.region.get_mut(offset).ok_or(BusError::OutOfRange)?;
        *slot = byte;
        Ok(())
    }

    fn read(&self, addr: u32, out: &mut [u8]) -> Result<(), BusError> {
        let offset = self.offset(addr).ok_or(BusError::OutOfRange)?;
        let end = offset.checked_add(out.len()).ok_or(BusError::OutOfRange)?;
        let src = self.region.get(offset..end).ok_or(BusError::OutOfRange)?;
        out.copy_from_slice(src);
        Ok(())
    }
}
