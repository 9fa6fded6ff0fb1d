//! # Step generator HAL
//!
//! Periodic driver for FPGA step generators with pluggable register
//! transports.
//!
//! # Module Structure
//!
//! - [`core`] - HalCore struct, periodic loop management
//! - [`transport_registry`] - Transport factory registration
//! - [`drivers`] - Register transport implementations
//! - [`error`] - Driver-level error type
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     stepgen_hal                              │
//! │  ┌──────────────┐    ┌──────────────┐    ┌────────────────┐  │
//! │  │ ChannelGroup │◄──►│   HalCore    │◄──►│   Transport    │  │
//! │  │ (control)    │    │   (loop)     │    │   Registry     │  │
//! │  └──────────────┘    └──────┬───────┘    └────────────────┘  │
//! │                             │                                │
//! │                             ▼                                │
//! │                   ┌───────────────────┐                      │
//! │                   │ RegisterTransport │ (trait object)       │
//! │                   └───────────────────┘                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod core;
pub mod drivers;
pub mod error;
pub mod transport_registry;

// Re-export key types for convenience
pub use crate::core::{HalCore, TimingStats};
pub use crate::error::HalError;
pub use crate::transport_registry::TransportRegistry;
