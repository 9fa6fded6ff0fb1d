//! Simulation transport.
//!
//! Emulates the step generator module of the FPGA: the register file plus
//! the DDS accumulators advancing with the clock.

mod stepgen;

pub use stepgen::SimulatedStepgen;

use stepgen_common::hal::transport::RegisterTransport;
use stepgen_common::hal::types::ModuleDescriptor;

/// Factory function to create a simulated module for `md`.
pub fn create_transport(md: &ModuleDescriptor) -> Box<dyn RegisterTransport> {
    Box::new(SimulatedStepgen::new(md))
}
