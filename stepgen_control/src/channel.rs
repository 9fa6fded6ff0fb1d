//! Per-instance state of one step generator.
//!
//! A [`Channel`] bundles what the operator sets ([`ChannelParams`]), the live
//! signals exchanged with the motion controller ([`ChannelPins`]), read-only
//! [`Telemetry`], the last timing values pushed to hardware
//! ([`TimingShadow`]) and the register cache ([`HwRegisters`]).

use stepgen_common::hal::config::ChannelConfig;
use stepgen_common::hal::consts::{NS_PER_SEC, STEP_TYPE_UNWRITTEN, TIMING_REGISTER_MAX};
use stepgen_common::hal::types::{ControlMode, StepType};

// ─── Parameters ─────────────────────────────────────────────────────

/// Operator parameters. Sanitized in place on the periodic path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelParams {
    /// Steps per engineering unit, never within 1e-6 of zero once used.
    pub position_scale: f64,
    /// Velocity limit [units/s], 0 = pulse timing limit only.
    pub maxvel: f64,
    /// Acceleration limit [units/s²], 0 = unlimited.
    pub maxaccel: f64,
    /// Step pulse length [ns].
    pub steplen: u32,
    /// Minimum idle time between pulses [ns].
    pub stepspace: u32,
    /// Direction setup time [ns].
    pub dirsetup: u32,
    /// Direction hold time [ns].
    pub dirhold: u32,
    /// Raw step type, see [`StepType`].
    pub step_type: u32,
}

impl ChannelParams {
    /// Power-on values: unit scale, no velocity limit, maxaccel 1.0 and
    /// the slowest timing the registers can hold at `clock_hz`.
    pub fn power_on(clock_hz: u32) -> Self {
        let slowest = slowest_timing_ns(clock_hz);
        Self {
            position_scale: 1.0,
            maxvel: 0.0,
            maxaccel: 1.0,
            steplen: slowest,
            stepspace: slowest,
            dirsetup: slowest,
            dirhold: slowest,
            step_type: StepType::StepDir as u32,
        }
    }
}

/// Largest timing parameter representable at `clock_hz`, truncated to ns.
#[inline]
pub fn slowest_timing_ns(clock_hz: u32) -> u32 {
    (TIMING_REGISTER_MAX as f64 * NS_PER_SEC / clock_hz as f64) as u32
}

// ─── Signals ────────────────────────────────────────────────────────

/// Live signals exchanged with the motion controller every period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelPins {
    /// Commanded position [units] (in).
    pub position_cmd: f64,
    /// Commanded velocity [units/s], velocity mode only (in).
    pub velocity_cmd: f64,
    /// Decoded position [units] (out).
    pub position_fb: f64,
    /// Velocity sent to the hardware last period [units/s] (out).
    pub velocity_fb: f64,
    /// Whole steps (out).
    pub counts: i32,
    /// Enable input.
    pub enable: bool,
    /// Position or velocity control.
    pub control_mode: ControlMode,
}

/// Intermediate controller values, read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    /// position_fb minus the previous period's position_cmd.
    pub pos_minus_prev_cmd: f64,
    /// Feedforward velocity.
    pub ff_vel: f64,
    /// velocity_fb minus ff_vel.
    pub vel_error: f64,
    /// Seconds until velocities match.
    pub s_to_match: f64,
    /// Predicted position error at velocity match.
    pub err_at_match: f64,
    /// Step-rate register as a signed phase increment.
    pub step_rate: i32,
}

/// Last timing values pushed to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingShadow {
    /// Written steplen [ns].
    pub steplen: u32,
    /// Written stepspace [ns].
    pub stepspace: u32,
    /// Written dirsetup [ns].
    pub dirsetup: u32,
    /// Written dirhold [ns].
    pub dirhold: u32,
    /// Written step type.
    pub step_type: u32,
}

impl Default for TimingShadow {
    fn default() -> Self {
        Self {
            steplen: 0,
            stepspace: 0,
            dirsetup: 0,
            dirhold: 0,
            step_type: STEP_TYPE_UNWRITTEN,
        }
    }
}

/// Register cache, one word per register the core drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HwRegisters {
    /// DDS phase increment.
    pub step_rate: u32,
    /// Last raw accumulator read.
    pub accumulator: u32,
    /// Step type.
    pub mode: u32,
    /// Direction setup [clocks].
    pub dir_setup: u32,
    /// Direction hold [clocks].
    pub dir_hold: u32,
    /// Pulse width [clocks].
    pub pulse_width: u32,
    /// Pulse idle width [clocks].
    pub pulse_idle_width: u32,
}

// ─── Channel ────────────────────────────────────────────────────────

/// Enable state, re-evaluated from the `enable` input every period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Controller runs, rate register follows it.
    Enabled,
    /// Controller skipped, rate register forced to zero.
    Disabled,
}

/// One step generator instance.
#[derive(Debug, Clone)]
pub struct Channel {
    index: usize,
    /// Operator parameters.
    pub params: ChannelParams,
    /// Live signals.
    pub pins: ChannelPins,
    /// Controller intermediates.
    pub telemetry: Telemetry,
    pub(crate) written: TimingShadow,
    pub(crate) hw: HwRegisters,
    pub(crate) prev_raw_accumulator: u32,
    pub(crate) subcounts: i64,
    pub(crate) old_position_cmd: f64,
}

impl Channel {
    /// Channel `index` with power-on defaults for a `clock_hz` module.
    pub fn new(index: usize, clock_hz: u32) -> Self {
        Self {
            index,
            params: ChannelParams::power_on(clock_hz),
            pins: ChannelPins::default(),
            telemetry: Telemetry::default(),
            written: TimingShadow::default(),
            hw: HwRegisters::default(),
            prev_raw_accumulator: 0,
            subcounts: 0,
            old_position_cmd: 0.0,
        }
    }

    /// Instance index inside the module.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current enable state.
    #[inline]
    pub fn state(&self) -> ChannelState {
        if self.pins.enable {
            ChannelState::Enabled
        } else {
            ChannelState::Disabled
        }
    }

    /// Position in 1/65536 steps since initialization.
    pub fn subcounts(&self) -> i64 {
        self.subcounts
    }

    /// Accumulator value the next delta is measured from.
    pub fn prev_raw_accumulator(&self) -> u32 {
        self.prev_raw_accumulator
    }

    /// Position command seen by the previous controller run.
    pub fn old_position_cmd(&self) -> f64 {
        self.old_position_cmd
    }

    /// Timing values last pushed to hardware.
    pub fn written(&self) -> &TimingShadow {
        &self.written
    }

    /// Register cache.
    pub fn registers(&self) -> &HwRegisters {
        &self.hw
    }

    /// Measure the next accumulator delta from the last raw value read.
    pub fn resync_accumulator(&mut self) {
        self.prev_raw_accumulator = self.hw.accumulator;
    }

    /// Treat the current position command as already followed.
    pub fn resync_position_cmd(&mut self) {
        self.old_position_cmd = self.pins.position_cmd;
    }

    /// Apply the fields present in `config`; absent fields keep their value.
    pub fn apply_config(&mut self, config: &ChannelConfig) {
        let p = &mut self.params;
        if let Some(v) = config.position_scale {
            p.position_scale = v;
        }
        if let Some(v) = config.maxvel {
            p.maxvel = v;
        }
        if let Some(v) = config.maxaccel {
            p.maxaccel = v;
        }
        if let Some(v) = config.steplen {
            p.steplen = v;
        }
        if let Some(v) = config.stepspace {
            p.stepspace = v;
        }
        if let Some(v) = config.dirsetup {
            p.dirsetup = v;
        }
        if let Some(v) = config.dirhold {
            p.dirhold = v;
        }
        if let Some(v) = config.step_type {
            p.step_type = v;
        }

        let pins = &mut self.pins;
        if let Some(mode) = config.control_mode {
            pins.control_mode = mode;
        }
        if let Some(enable) = config.enable {
            pins.enable = enable;
        }
        if let Some(v) = config.position_cmd {
            pins.position_cmd = v;
        }
        if let Some(v) = config.velocity_cmd {
            pins.velocity_cmd = v;
        }
    }
}
