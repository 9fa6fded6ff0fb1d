//! Driver-level error type.

use stepgen_common::config::ConfigError;
use stepgen_common::hal::transport::TransportError;
use stepgen_control::SetupError;
use thiserror::Error;

/// Errors surfaced by [`HalCore`](crate::core::HalCore).
#[derive(Debug, Error)]
pub enum HalError {
    /// Board configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Module layout or instance count rejected.
    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    /// Register access failed.
    #[error("Hardware communication error: {0}")]
    Transport(#[from] TransportError),

    /// Operation requires `init()` first.
    #[error("Initialization failed: {0}")]
    InitFailed(String),
}
