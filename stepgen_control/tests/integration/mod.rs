//! Shared fixtures for the integration tests.

mod period;
mod timing_sync;

use stepgen_common::prelude::*;

/// Module at 0x2000, 0x100 between registers, 50 MHz.
pub fn descriptor(instances: u8) -> ModuleDescriptor {
    ModuleDescriptor {
        version: 1,
        num_registers: 10,
        instance_stride: 4,
        multiple_registers: 0x01FF,
        clock_frequency_hz: 50_000_000,
        base_address: 0x2000,
        register_stride: 0x100,
        instances,
    }
}

/// Flat little-endian register file that logs every write transaction.
pub struct RegisterFile {
    bytes: Vec<u8>,
    /// `(address, length in bytes)` of every write, in order.
    pub writes: Vec<(u32, usize)>,
    /// Number of read transactions.
    pub reads: usize,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; 0x3000],
            writes: Vec::new(),
            reads: 0,
        }
    }

    pub fn word(&self, addr: u32) -> u32 {
        let a = addr as usize;
        u32::from_le_bytes([
            self.bytes[a],
            self.bytes[a + 1],
            self.bytes[a + 2],
            self.bytes[a + 3],
        ])
    }

    pub fn set_word(&mut self, addr: u32, value: u32) {
        let a = addr as usize;
        self.bytes[a..a + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn span(&self, addr: u32, len: usize) -> Result<std::ops::Range<usize>, TransportError> {
        let start = addr as usize;
        if start + len > self.bytes.len() {
            return Err(TransportError::OutOfRange { addr, len });
        }
        Ok(start..start + len)
    }
}

impl RegisterTransport for RegisterFile {
    fn name(&self) -> &'static str {
        "register-file"
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), TransportError> {
        let span = self.span(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes[span]);
        self.reads += 1;
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), TransportError> {
        let span = self.span(addr, data.len())?;
        self.bytes[span].copy_from_slice(data);
        self.writes.push((addr, data.len()));
        Ok(())
    }
}
