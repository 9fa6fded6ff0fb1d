//! Velocity-mode control: follow `velocity_cmd` under the acceleration limit.

use super::limits::rate_limit;
use crate::channel::ChannelPins;

/// Velocity command for this period in velocity mode.
#[inline]
pub fn velocity_compute(pins: &ChannelPins, maxaccel: f64, period_s: f64) -> f64 {
    rate_limit(pins.velocity_cmd, pins.velocity_fb, maxaccel, period_s)
}
