//! Step-rate encoding.
//!
//! The FPGA adds the step-rate register to its accumulator every clock.
//! One full step is 2^32 of phase, so a rate of `f` steps/s needs a
//! per-clock increment of `f · 2^32 / clock`. Negative rates are stored
//! as two's complement.

use stepgen_common::hal::consts::PHASE_RANGE;

use crate::channel::{Channel, ChannelState};

/// Phase increment for `velocity` [units/s].
#[inline]
pub fn phase_increment(velocity: f64, position_scale: f64, clock_hz: u32) -> u32 {
    let steps_per_sec = velocity * position_scale;
    (steps_per_sec * (PHASE_RANGE / clock_hz as f64)) as i64 as u32
}

/// Step-rate register value for `channel`.
///
/// Disabled channels always encode to `0`.
#[inline]
pub fn encode(channel: &Channel, clock_hz: u32) -> u32 {
    match channel.state() {
        ChannelState::Disabled => 0,
        ChannelState::Enabled => phase_increment(
            channel.pins.velocity_fb,
            channel.params.position_scale,
            clock_hz,
        ),
    }
}
