//! Register transport trait and error types.
//!
//! The transport is the only path between the control core and the FPGA.
//! It is synchronous and bounded-latency: every call completes (or fails)
//! before returning, and the core never retries or queues.
//!
//! Registers are little-endian 32-bit words. The word-level helpers are
//! provided methods so a transport only has to implement byte access.

use crate::consts::MAX_CHANNELS;
use crate::hal::types::ModuleDescriptor;
use std::time::Duration;
use thiserror::Error;

/// Error types for register transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Access touches addresses the transport does not map.
    #[error("address range 0x{addr:04X}+{len} is out of range")]
    OutOfRange {
        /// First byte address of the access.
        addr: u32,
        /// Access length in bytes.
        len: usize,
    },

    /// Access is not aligned to a 32-bit word.
    #[error("misaligned access at 0x{addr:04X} (len {len})")]
    Misaligned {
        /// First byte address of the access.
        addr: u32,
        /// Access length in bytes.
        len: usize,
    },

    /// Link to the board is down.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// No transport registered under this name.
    #[error("transport not found: {0}")]
    NotFound(String),
}

/// Factory function type for creating transport instances for one module.
pub type TransportFactory = fn(&ModuleDescriptor) -> Box<dyn RegisterTransport>;

/// Synchronous register access to one board.
///
/// # Timing Contracts
///
/// | Operation | RT Constraint |
/// |-----------|---------------|
/// | `read()` / `write()` | bounded latency, no allocation |
/// | `read_region()` / `write_region()` | one transaction per call chunk |
pub trait RegisterTransport: Send {
    /// Returns the transport's identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Read `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Write `data` starting at `addr`.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), TransportError>;

    /// Let simulated hardware run for `elapsed`. Real boards ignore it.
    fn advance(&mut self, _elapsed: Duration) {}

    /// Write one register word.
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), TransportError> {
        self.write(addr, &value.to_le_bytes())
    }

    /// Read one register word.
    fn read_u32(&mut self, addr: u32) -> Result<u32, TransportError> {
        let mut buf = [0u8; 4];
        self.read(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Batched read of consecutive words (a tram read region).
    fn read_region(&mut self, addr: u32, words: &mut [u32]) -> Result<(), TransportError> {
        let mut buf = [0u8; MAX_CHANNELS * 4];
        for (chunk_idx, chunk) in words.chunks_mut(MAX_CHANNELS).enumerate() {
            let bytes = &mut buf[..chunk.len() * 4];
            let chunk_addr = addr + (chunk_idx * MAX_CHANNELS * 4) as u32;
            self.read(chunk_addr, bytes)?;
            for (word, raw) in chunk.iter_mut().zip(bytes.chunks_exact(4)) {
                *word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
        }
        Ok(())
    }

    /// Batched write of consecutive words (a tram write region).
    fn write_region(&mut self, addr: u32, words: &[u32]) -> Result<(), TransportError> {
        let mut buf = [0u8; MAX_CHANNELS * 4];
        for (chunk_idx, chunk) in words.chunks(MAX_CHANNELS).enumerate() {
            for (word, raw) in chunk.iter().zip(buf.chunks_exact_mut(4)) {
                raw.copy_from_slice(&word.to_le_bytes());
            }
            let chunk_addr = addr + (chunk_idx * MAX_CHANNELS * 4) as u32;
            self.write(chunk_addr, &buf[..chunk.len() * 4])?;
        }
        Ok(())
    }
}
