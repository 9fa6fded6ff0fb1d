//! Velocity/position controller root.
//!
//! [`compute`] sanitizes the limits, runs the controller selected by
//! `control_mode`, clamps the result to the velocity limit and stores it
//! in `velocity_fb`. There is no velocity sensor: `velocity_fb` is the
//! velocity the hardware was told to produce.

pub mod limits;
pub mod position;
pub mod velocity;

use stepgen_common::hal::types::ControlMode;

use crate::channel::Channel;
use crate::diag::Diagnostics;

use limits::{
    clamp_velocity, clip_maxvel, effective_maxvel, physical_maxvel, sanitize_maxaccel,
    sanitize_maxvel,
};
use position::position_compute;
use velocity::velocity_compute;

/// Run one controller period on an enabled channel.
///
/// Returns the bounded velocity command, also written to `velocity_fb`.
pub fn compute(channel: &mut Channel, period_s: f64, diags: &mut Diagnostics) -> f64 {
    let index = channel.index();
    let params = &mut channel.params;

    let physical = physical_maxvel(params.steplen, params.stepspace, params.position_scale);

    let (maxvel, correction) = sanitize_maxvel(params.maxvel);
    diags.report(index, correction);
    let (maxvel, correction) = clip_maxvel(maxvel, physical);
    diags.report(index, correction);
    params.maxvel = maxvel;
    let limit = effective_maxvel(maxvel, physical);

    let (maxaccel, correction) = sanitize_maxaccel(params.maxaccel);
    diags.report(index, correction);
    params.maxaccel = maxaccel;

    let velocity = match channel.pins.control_mode {
        ControlMode::Position => position_compute(channel, period_s),
        ControlMode::Velocity => velocity_compute(&channel.pins, maxaccel, period_s),
    };

    let velocity = clamp_velocity(velocity, limit);
    channel.pins.velocity_fb = velocity;
    velocity
}

// ─── Tests ──────────────────────────────────────────────────────────
