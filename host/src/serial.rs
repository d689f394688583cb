//! The host's serial port, abstracted behind a small trait so the
//! transport stays testable against an in-memory pipe (spec.md §9).

use std::io::{self, Read, Write};
use std::time::Duration;

/// What the transport needs from a serial port: write the whole frame,
/// read one byte with a timeout, reconfigure the baud rate, and drain the
/// transmit buffer before a baud change. Real terminal-state restoration
/// on exit is the CLI's job (it owns the `Transport` and drops it on every
/// exit path); this trait only covers what the protocol core touches.
pub trait SerialChannel {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read one byte, or `Ok(None)` if the per-call timeout elapsed
    /// without a byte arriving.
    fn read_byte_with_timeout(&mut self) -> io::Result<Option<u8>>;

    fn set_baud(&mut self, baud: u32) -> io::Result<()>;

    /// Block until all transmitted bytes have left the host.
    fn drain(&mut self) -> io::Result<()>;
}

/// A [`SerialChannel`] backed by a real `serialport::SerialPort`.
pub struct HostSerialPort {
    port: Box<dyn serialport::SerialPort>,
}

impl HostSerialPort {
    pub fn open(path: &str, baud: u32, timeout: Duration) -> io::Result<Self> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Self { port })
    }
}

impl SerialChannel for HostSerialPort {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn read_byte_with_timeout(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_baud(&mut self, baud: u32) -> io::Result<()> {
        self.port
            .set_baud_rate(baud)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn drain(&mut self) -> io::Result<()> {
        self.port
            .flush()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// An in-memory [`SerialChannel`] test double: writes accumulate in `tx`,
/// reads are served from a preloaded `rx` queue. Used to drive the
/// transport's retry logic and a fake device responder in tests without
/// real hardware.
#[cfg(test)]
pub struct LoopbackChannel {
    pub tx: std::collections::VecDeque<u8>,
    pub rx: std::collections::VecDeque<u8>,
    pub baud: u32,
}

#[cfg(test)]
impl LoopbackChannel {
    pub fn new(baud: u32) -> Self {
        Self {
            tx: std::collections::VecDeque::new(),
            rx: std::collections::VecDeque::new(),
            baud,
        }
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn take_tx(&mut self) -> std::vec::Vec<u8> {
        self.tx.drain(..).collect()
    }
}

#[cfg(test)]
impl SerialChannel for LoopbackChannel {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.extend(bytes.iter().copied());
        Ok(())
    }

    fn read_byte_with_timeout(&mut self) -> io::Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }

    fn set_baud(&mut self, baud: u32) -> io::Result<()> {
        self.baud = baud;
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        Ok(())
    }
}
