//! The packet server: dispatches each validated packet to a handler,
//! mutates the implicit pending-write/divider state, and writes the
//! response. `feed_byte` is the single entry point an interrupt-free
//! polling loop drives, one byte at a time.

use core::fmt::Write as _;

use boaprog_protocol::{
    types::{AckPayload, AddrLenPayload, AddrPayload, SpeedPayload, PING_LEN},
    AckCode, FrameError, Header, PayloadSink, ReceiveEvent, Receiver, RequestType,
};

use crate::bus::MemoryBus;
use crate::control::ControlOps;
use crate::uart::Uart;

/// Base clock frequency the divider is computed against. The spec leaves
/// this device-specific; this implementation's choice, documented in
/// DESIGN.md.
pub const BASE_FREQ: u32 = 50_000_000;

const MIN_DIVIDER: u32 = 4;
const MAX_DIVIDER: u32 = 65535;

#[derive(Debug, Clone, Copy)]
struct PendingWrite {
    addr: u32,
    length: u32,
}

/// Streams `P_WDATA` payload bytes directly into the memory bus at the
/// pending write address, clipping to `min(pending.length, header.length)`
/// per this implementation's resolution of the spec's open `WDATA`
/// length-mismatch question (§9): bytes beyond that bound are still
/// consumed (so framing stays in sync) but discarded rather than written.
struct BusSink<'a, B: MemoryBus> {
    bus: &'a mut B,
    base_addr: u32,
    limit: usize,
}

impl<'a, B: MemoryBus> PayloadSink for BusSink<'a, B> {
    fn write(&mut self, offset: usize, byte: u8) {
        if offset < self.limit {
            let _ = self.bus.write_byte(self.base_addr.wrapping_add(offset as u32), byte);
        }
    }
}

struct FixedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> core::fmt::Write for FixedWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let end = self.len + bytes.len();
        if end > self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

struct UartSink<'a, U: Uart>(&'a mut U);

impl<'a, U: Uart> boaprog_protocol::FrameSink for UartSink<'a, U> {
    fn put(&mut self, byte: u8) {
        self.0.write_byte(byte);
    }
}

/// The device-side endpoint. `CAP` bounds both the receiver's generic
/// payload buffer and the largest `RDATA`/`IDENT` response this server can
/// build in one shot (it is also what the `IDENT` string's `maxdata`
/// field advertises).
pub struct PacketServer<const CAP: usize, B, U, C> {
    receiver: Receiver<CAP>,
    pending_write: Option<PendingWrite>,
    bus: B,
    uart: U,
    control: C,
}

impl<const CAP: usize, B: MemoryBus, U: Uart, C: ControlOps> PacketServer<CAP, B, U, C> {
    pub fn new(bus: B, uart: U, control: C) -> Self {
        Self {
            receiver: Receiver::new(),
            pending_write: None,
            bus,
            uart,
            control,
        }
    }

    /// Feed one byte received from the UART through the protocol state
    /// machine, dispatching and responding in place when a frame
    /// completes. Called from an interrupt-free polling loop.
    pub fn feed_byte(&mut self, byte: u8) {
        let limit = match self.pending_write {
            Some(pending) => (pending.length as usize).min(self.receiver.header().length as usize),
            None => 0,
        };
        let base_addr = self.pending_write.map(|p| p.addr).unwrap_or(0);
        let mut sink = BusSink {
            bus: &mut self.bus,
            base_addr,
            limit,
        };

        match self.receiver.feed(byte, &mut sink) {
            Some(ReceiveEvent::Packet { ty, length }) => self.dispatch(ty, length),
            Some(ReceiveEvent::Error(FrameError::Checksum { received, computed })) => {
                self.send_ack(AckCode::Xsum, AckPayload::xsum_cause(received, computed))
            }
            Some(ReceiveEvent::Error(FrameError::OverCapacity { .. })) => {
                self.send_ack(AckCode::Ncap, 0)
            }
            None => {}
        }
    }

    fn send_packet(&mut self, ty: u32, payload: &[u8]) {
        let header = Header::new(ty, payload.len() as u32);
        boaprog_protocol::encode_frame(header, payload, &mut UartSink(&mut self.uart));
    }

    fn send_ack(&mut self, code: AckCode, cause: u32) {
        let payload = AckPayload::new(code, cause).to_bytes();
        self.send_packet(RequestType::Ack.as_u32(), &payload);
    }

    fn dispatch(&mut self, ty: u32, length: u32) {
        match RequestType::try_from(ty) {
            Ok(RequestType::Ping) => self.handle_ping(length),
            Ok(RequestType::Who) => self.handle_who(length),
            Ok(RequestType::Speed) => self.handle_speed(length),
            Ok(RequestType::Write) => self.handle_write(length),
            Ok(RequestType::Read) => self.handle_read(length),
            Ok(RequestType::Wdata) => self.handle_wdata(),
            Ok(RequestType::Jump) => self.handle_jump(length),
            Ok(RequestType::Call) => self.handle_call(length),
            // PONG/ACK/IDENT/RDATA are response-only types; unknown types
            // fall here too. Both are simply unsupported requests.
            _ => self.send_ack(AckCode::Ncap, 0),
        }
    }

    fn handle_ping(&mut self, length: u32) {
        if length as usize != PING_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let mut nonce = [0u8; PING_LEN];
        nonce.copy_from_slice(&self.receiver.payload()[..PING_LEN]);
        self.send_packet(RequestType::Pong.as_u32(), &nonce);
    }

    fn handle_who(&mut self, length: u32) {
        if length != 0 {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let mut buf = [0u8; 96];
        let written_len = {
            let mut writer = FixedWriter { buf: &mut buf, len: 0 };
            let _ = write!(
                writer,
                "cpus=1,cpu='Boa32',isa='RV32IM_Zicsr_Zifencei',maxdata={CAP}"
            );
            writer.len
        };
        self.send_packet(RequestType::Ident.as_u32(), &buf[..written_len]);
    }

    fn handle_speed(&mut self, length: u32) {
        if length as usize != SpeedPayload::WIRE_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let req = SpeedPayload::from_bytes(self.receiver.payload()).unwrap();
        let divider = if req.speed == 0 {
            0
        } else {
            BASE_FREQ / req.speed
        };
        if !(MIN_DIVIDER..=MAX_DIVIDER).contains(&divider) {
            return self.send_ack(AckCode::Nspeed, 0);
        }
        self.send_ack(AckCode::Ack, 0);
        self.uart.drain_tx();
        self.uart.set_divider(divider as u16);
    }

    fn handle_write(&mut self, length: u32) {
        if length as usize != AddrLenPayload::WIRE_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let req = AddrLenPayload::from_bytes(self.receiver.payload()).unwrap();
        self.pending_write = Some(PendingWrite {
            addr: req.addr,
            length: req.length,
        });
        self.send_ack(AckCode::Ack, 0);
    }

    fn handle_read(&mut self, length: u32) {
        if length as usize != AddrLenPayload::WIRE_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let req = AddrLenPayload::from_bytes(self.receiver.payload()).unwrap();
        if req.length as usize > CAP {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let mut buf = [0u8; CAP];
        let dest = &mut buf[..req.length as usize];
        if self.bus.read(req.addr, dest).is_err() {
            return self.send_ack(AckCode::Addr, 0);
        }
        self.send_packet(RequestType::Rdata.as_u32(), dest);
    }

    fn handle_wdata(&mut self) {
        // The payload bytes were already streamed into the bus during
        // receive (see `feed_byte`'s `BusSink`); this just clears the
        // pending-write state the preceding `WRITE` established.
        self.pending_write = None;
        self.send_ack(AckCode::Ack, 0);
    }

    fn handle_jump(&mut self, length: u32) {
        if length as usize != AddrPayload::WIRE_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let addr = AddrPayload::from_bytes(self.receiver.payload()).unwrap().addr;
        self.send_ack(AckCode::Ack, 0);
        self.control.disable_interrupts();
        self.control.fence();
        self.control.jump(addr);
        // Only reached if `jump` returns, which real firmware never does;
        // re-entering `_start` from here is the boot loop's job, outside
        // this crate's scope.
        self.control.disable_interrupts();
    }

    fn handle_call(&mut self, length: u32) {
        if length as usize != AddrPayload::WIRE_LEN {
            return self.send_ack(AckCode::Ncap, 0);
        }
        let addr = AddrPayload::from_bytes(self.receiver.payload()).unwrap().addr;
        self.send_ack(AckCode::Ack, 0);
        self.control.fence();
        self.control.call(addr);
    }
}
