//! Board and channel configuration loaded from `board.toml`.
//!
//! ```toml
//! period_us = 1000
//! num_stepgens = -1
//! transport = "simulation"
//!
//! [shared]
//! service_name = "stepgen-bench"
//!
//! [descriptor]
//! version = 1
//! clock_frequency_hz = 50000000
//! base_address = 0x2000
//! register_stride = 0x100
//! instances = 4
//!
//! [[channels]]
//! index = 0
//! position_scale = 200.0
//! maxaccel = 50.0
//! steplen = 2000
//! stepspace = 2000
//! enable = true
//! ```
//!
//! Every per-channel field is optional; omitted fields keep the power-on
//! default of the channel.

use crate::config::{ConfigError, SharedConfig, Validate};
use crate::consts::{DEFAULT_PERIOD_US, MAX_CHANNELS};
use crate::hal::types::{ControlMode, InstanceRequest, ModuleDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

fn default_period_us() -> u32 {
    DEFAULT_PERIOD_US
}

fn default_num_stepgens() -> i32 {
    -1
}

fn default_transport() -> String {
    "simulation".to_string()
}

/// Main configuration loaded from `board.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Service name and log level.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Control period in microseconds.
    #[serde(default = "default_period_us")]
    pub period_us: u32,

    /// Registered transport to open (e.g., "simulation").
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Instances to claim: -1 = all, 0 = none, n = exactly n.
    #[serde(default = "default_num_stepgens")]
    pub num_stepgens: i32,

    /// Module layout reported by the firmware.
    pub descriptor: ModuleDescriptor,

    /// Per-channel operator settings.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl BoardConfig {
    /// Control period as Duration.
    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us as u64)
    }

    /// Parsed `num_stepgens`.
    pub fn instance_request(&self) -> Result<InstanceRequest, ConfigError> {
        InstanceRequest::try_from(self.num_stepgens).map_err(|raw| {
            ConfigError::ValidationError(format!("num_stepgens must be >= -1 (got {raw})"))
        })
    }

    /// Number of instances that will exist once the group is built.
    fn claimed_instances(&self) -> Result<usize, ConfigError> {
        Ok(match self.instance_request()? {
            InstanceRequest::All => self.descriptor.instances as usize,
            InstanceRequest::Count(n) => n,
        })
    }
}

impl Validate for BoardConfig {
    /// # Validation Rules
    /// 1. `period_us` > 0
    /// 2. descriptor clock > 0
    /// 3. descriptor registers fit the 32-bit address space
    /// 4. `num_stepgens` >= -1 and <= `MAX_CHANNELS`
    /// 5. channel indices unique and below the claimed instance count
    /// 6. channel floating point values finite
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.period_us == 0 {
            return Err(ConfigError::ValidationError(
                "period_us must be greater than 0".to_string(),
            ));
        }

        if self.descriptor.clock_frequency_hz == 0 {
            return Err(ConfigError::ValidationError(
                "descriptor.clock_frequency_hz must be greater than 0".to_string(),
            ));
        }

        if self.descriptor.register_map().end_address().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "descriptor registers overflow the address space (base 0x{:08X}, stride 0x{:X})",
                self.descriptor.base_address, self.descriptor.register_stride
            )));
        }

        let claimed = self.claimed_instances()?;
        if claimed > MAX_CHANNELS {
            return Err(ConfigError::ValidationError(format!(
                "Too many step generators: {claimed} (max {MAX_CHANNELS})"
            )));
        }

        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.index) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate channel index: {}",
                    channel.index
                )));
            }
            if channel.index >= claimed {
                return Err(ConfigError::ValidationError(format!(
                    "Channel {} out of range ({} instances claimed)",
                    channel.index, claimed
                )));
            }
            channel.validate()?;
        }

        Ok(())
    }
}

/// Operator settings for one step generator instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Instance index inside the module.
    pub index: usize,

    /// Steps per engineering unit.
    #[serde(default)]
    pub position_scale: Option<f64>,
    /// Velocity limit in units/s (0 = limited only by pulse timing).
    #[serde(default)]
    pub maxvel: Option<f64>,
    /// Acceleration limit in units/s² (0 = unlimited).
    #[serde(default)]
    pub maxaccel: Option<f64>,

    /// Step pulse length [ns].
    #[serde(default)]
    pub steplen: Option<u32>,
    /// Minimum space between step pulses [ns].
    #[serde(default)]
    pub stepspace: Option<u32>,
    /// Direction setup before a step [ns].
    #[serde(default)]
    pub dirsetup: Option<u32>,
    /// Direction hold after a step [ns].
    #[serde(default)]
    pub dirhold: Option<u32>,
    /// Raw step type (0 = step/dir, 1 = up/down, 2 = table).
    #[serde(default)]
    pub step_type: Option<u32>,

    /// Position or velocity control.
    #[serde(default)]
    pub control_mode: Option<ControlMode>,
    /// Enable input.
    #[serde(default)]
    pub enable: Option<bool>,
    /// Initial position command [units].
    #[serde(default)]
    pub position_cmd: Option<f64>,
    /// Initial velocity command [units/s].
    #[serde(default)]
    pub velocity_cmd: Option<f64>,
}

impl Validate for ChannelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("position_scale", self.position_scale),
            ("maxvel", self.maxvel),
            ("maxaccel", self.maxaccel),
            ("position_cmd", self.position_cmd),
            ("velocity_cmd", self.velocity_cmd),
        ];
        for (name, value) in floats {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ConfigError::ValidationError(format!(
                        "Channel {}: {name} must be finite",
                        self.index
                    )));
                }
            }
        }
        Ok(())
    }
}
