//! Hardware-facing definitions shared by the control core and the drivers.
//!
//! - [`consts`] - Register layout and fixed-point constants
//! - [`types`] - Register identities, step/control enums, module descriptor
//! - [`transport`] - The register transport trait and its error type
//! - [`config`] - Board and per-channel TOML configuration

pub mod config;
pub mod consts;
pub mod transport;
pub mod types;
