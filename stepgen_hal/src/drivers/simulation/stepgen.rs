//! Simulated step generator register file.
//!
//! Each instance owns a 64-bit phase accumulator in which one step is
//! 2^32. Every clock tick adds the signed step-rate register to it; the
//! visible accumulator register is the phase shifted down to 16.16 steps.
//! Nothing advances until the master DDS register holds the enable value.

use std::time::Duration;

use stepgen_common::consts::MAX_CHANNELS;
use stepgen_common::hal::consts::{
    INSTANCE_STRIDE, MASTER_ENABLE_VALUE, NUM_REGISTERS, PHASE_RANGE, SUBCOUNT_BITS,
};
use stepgen_common::hal::transport::{RegisterTransport, TransportError};
use stepgen_common::hal::types::{ModuleDescriptor, Register, RegisterMap};
use tracing::{debug, trace};

/// Register file and DDS state of one simulated module.
pub struct SimulatedStepgen {
    map: RegisterMap,
    instances: usize,
    clock_frequency_hz: u32,
    /// Register words, indexed `[register][instance]`.
    regs: [[u32; MAX_CHANNELS]; NUM_REGISTERS as usize],
    /// Phase accumulators, one step = 2^32.
    phase: [i64; MAX_CHANNELS],
    /// Clock cycles not yet applied.
    clock_residue: f64,
    reads: u64,
    writes: u64,
}

impl SimulatedStepgen {
    /// Module with every instance the descriptor advertises.
    pub fn new(md: &ModuleDescriptor) -> Self {
        let instances = (md.instances as usize).min(MAX_CHANNELS);
        debug!(
            "Simulated stepgen: {} instances at 0x{:04X}, {} Hz",
            instances, md.base_address, md.clock_frequency_hz
        );
        Self {
            map: md.register_map(),
            instances,
            clock_frequency_hz: md.clock_frequency_hz,
            regs: [[0; MAX_CHANNELS]; NUM_REGISTERS as usize],
            phase: [0; MAX_CHANNELS],
            clock_residue: 0.0,
            reads: 0,
            writes: 0,
        }
    }

    /// Current value of `reg` for `index`.
    pub fn register(&self, reg: Register, index: usize) -> Option<u32> {
        self.slot(reg, index).map(|(k, i)| self.word(k, i))
    }

    /// Position of instance `index` in steps.
    pub fn position_steps(&self, index: usize) -> Option<f64> {
        (index < self.instances).then(|| self.phase[index] as f64 / PHASE_RANGE)
    }

    /// Whether the master DDS has been enabled.
    pub fn dds_enabled(&self) -> bool {
        self.regs[Register::MasterDds.index() as usize][0] == MASTER_ENABLE_VALUE
    }

    /// `(reads, writes)` transactions served.
    pub fn transactions(&self) -> (u64, u64) {
        (self.reads, self.writes)
    }

    fn slot(&self, reg: Register, index: usize) -> Option<(usize, usize)> {
        let valid = match reg {
            Register::MasterDds => index == 0,
            _ => index < self.instances,
        };
        valid.then_some((reg.index() as usize, index))
    }

    fn word(&self, k: usize, i: usize) -> u32 {
        if k == Register::Accumulator.index() as usize {
            (self.phase[i] >> SUBCOUNT_BITS) as u32
        } else {
            self.regs[k][i]
        }
    }

    /// Validate an access and resolve its first word.
    fn resolve(&self, addr: u32, len: usize) -> Result<(Register, usize, usize), TransportError> {
        if addr % INSTANCE_STRIDE != 0 || len % INSTANCE_STRIDE as usize != 0 {
            return Err(TransportError::Misaligned { addr, len });
        }
        let words = len / INSTANCE_STRIDE as usize;
        let out_of_range = TransportError::OutOfRange { addr, len };
        let (reg, index) = self.map.decode(addr).ok_or(out_of_range.clone())?;
        let last = index + words.saturating_sub(1);
        match reg {
            Register::MasterDds if last != 0 => Err(out_of_range),
            Register::MasterDds => Ok((reg, index, words)),
            _ if last >= self.instances => Err(out_of_range),
            _ => Ok((reg, index, words)),
        }
    }
}

impl RegisterTransport for SimulatedStepgen {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), TransportError> {
        let (reg, first, _) = self.resolve(addr, buf.len())?;
        let k = reg.index() as usize;
        for (offset, chunk) in buf.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&self.word(k, first + offset).to_le_bytes());
        }
        self.reads += 1;
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), TransportError> {
        let (reg, first, _) = self.resolve(addr, data.len())?;
        let k = reg.index() as usize;
        for (offset, chunk) in data.chunks_exact(4).enumerate() {
            let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            // The accumulator is read-only.
            if reg != Register::Accumulator {
                self.regs[k][first + offset] = value;
            }
        }
        self.writes += 1;
        trace!("sim write {} @0x{:04X} ({} bytes)", reg.name(), addr, data.len());
        Ok(())
    }

    fn advance(&mut self, elapsed: Duration) {
        if !self.dds_enabled() {
            return;
        }
        let clocks = elapsed.as_secs_f64() * self.clock_frequency_hz as f64 + self.clock_residue;
        let whole = clocks.floor();
        self.clock_residue = clocks - whole;
        let ticks = whole as i64;

        let rates = &self.regs[Register::StepRate.index() as usize];
        for (phase, rate) in self.phase.iter_mut().zip(rates).take(self.instances) {
            *phase = phase.wrapping_add((*rate as i32 as i64).wrapping_mul(ticks));
        }
    }
}
