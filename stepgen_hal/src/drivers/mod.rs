//! Register transport implementations.
//!
//! - [`simulation`] - In-memory step generator register file for development
//!   and testing without a board
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `RegisterTransport` from `stepgen_common::hal::transport`
//! 3. Register its factory in [`register_all`]

pub mod simulation;

use crate::transport_registry::TransportRegistry;

/// Register every built-in transport.
pub fn register_all(registry: &mut TransportRegistry) {
    registry.register("simulation", simulation::create_transport);
}
