//! Position-mode control.
//!
//! First-order feedforward from the change in `position_cmd` plus
//! proportional correction of the position error predicted at the moment
//! the velocities match.
//!
//! ```text
//! ff_vel          = (position_cmd − old_position_cmd) / T
//! vel_error       = velocity_fb − ff_vel
//! s_to_match      = −vel_error / match_accel
//! pos_at_match    = position_fb + ½(ff_vel + velocity_fb)·(s_to_match + T)
//! cmd_at_match    = position_cmd + ff_vel·s_to_match
//! err_at_match    = pos_at_match − cmd_at_match
//! ```

use super::limits::rate_limit;
use crate::channel::Channel;

/// Acceleration used to reach `ff_vel`.
///
/// With a limit the sign opposes `velocity_error`. Without one the value
/// is `−velocity_error / T` for a positive error and `velocity_error / T`
/// for a negative one, so the match time is `+T` or `−T` respectively.
#[inline]
pub fn match_accel(velocity_error: f64, maxaccel: f64, period_s: f64) -> f64 {
    if velocity_error > 0.0 {
        if maxaccel == 0.0 {
            -velocity_error / period_s
        } else {
            -maxaccel
        }
    } else if velocity_error < 0.0 {
        if maxaccel == 0.0 {
            velocity_error / period_s
        } else {
            maxaccel
        }
    } else {
        0.0
    }
}

/// Velocity command for this period in position mode.
///
/// Consumes `position_cmd` (it becomes the next `old_position_cmd`) and
/// fills the channel telemetry. Does not apply the velocity limit.
pub fn position_compute(channel: &mut Channel, period_s: f64) -> f64 {
    let maxaccel = channel.params.maxaccel;
    let position_cmd = channel.pins.position_cmd;
    let position_fb = channel.pins.position_fb;
    let velocity_fb = channel.pins.velocity_fb;

    channel.telemetry.pos_minus_prev_cmd = position_fb - channel.old_position_cmd;

    let ff_vel = (position_cmd - channel.old_position_cmd) / period_s;
    channel.telemetry.ff_vel = ff_vel;
    channel.old_position_cmd = position_cmd;

    let velocity_error = velocity_fb - ff_vel;
    channel.telemetry.vel_error = velocity_error;

    let mut accel = match_accel(velocity_error, maxaccel, period_s);
    let seconds_to_vel_match = if accel == 0.0 {
        0.0
    } else {
        -velocity_error / accel
    };
    channel.telemetry.s_to_match = seconds_to_vel_match;

    // Feedback position at the start of the period after velocity match.
    let avg_v = (ff_vel + velocity_fb) * 0.5;
    let position_at_match = position_fb + avg_v * (seconds_to_vel_match + period_s);
    // Assumes position_cmd keeps its current velocity.
    let position_cmd_at_match = position_cmd + ff_vel * seconds_to_vel_match;
    let error_at_match = position_at_match - position_cmd_at_match;
    channel.telemetry.err_at_match = error_at_match;

    if seconds_to_vel_match < period_s {
        let velocity_cmd = ff_vel - 0.5 * error_at_match / period_s;
        rate_limit(velocity_cmd, velocity_fb, maxaccel, period_s)
    } else {
        // Position change if we ramp the opposite way for one period.
        let dv = -2.0 * accel * period_s;
        let dp = dv * seconds_to_vel_match;
        if (error_at_match + dp * 2.0).abs() < error_at_match.abs() {
            accel = -accel;
        }
        velocity_fb + accel * period_s
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
