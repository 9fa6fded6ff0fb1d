//! Prelude module for common re-exports.
//!
//! ```rust
//! use stepgen_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::hal::config::{BoardConfig, ChannelConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_PERIOD, MAX_CHANNELS, MAX_DIAGNOSTICS};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::transport::{RegisterTransport, TransportError, TransportFactory};
pub use crate::hal::types::{
    ControlMode, InstanceRequest, ModuleDescriptor, Register, RegisterMap, StepType,
};
