//! System-wide constants for the step generator workspace.
//!
//! Single source of truth for numeric limits and default paths.

use std::time::Duration;

/// Maximum number of step generator instances in one group.
///
/// Sizes every fixed-capacity buffer used inside the periodic path.
pub const MAX_CHANNELS: usize = 32;

/// Maximum number of corrections reported from a single call into the core.
///
/// Worst case is every channel reporting scale, maxvel and maxaccel in the
/// same period, or all five timing fields during a forced resync.
pub const MAX_DIAGNOSTICS: usize = MAX_CHANNELS * 5;

/// Default control period in microseconds (1 kHz).
pub const DEFAULT_PERIOD_US: u32 = 1000;

/// Default control period as Duration.
pub const DEFAULT_PERIOD: Duration = Duration::from_micros(DEFAULT_PERIOD_US as u64);

/// Default board configuration path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/stepgen/board.toml";

/// Canonical service name used in logs.
pub const SERVICE_NAME: &str = "stepgen";
