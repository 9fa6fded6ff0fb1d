//! Accumulator decoding.
//!
//! The FPGA accumulator is a free-running 16.16 fixed-point step counter
//! that wraps at 2^32. Each period the signed displacement since the last
//! read is folded into a 64-bit subcount total, which never wraps in
//! practice.
//!
//! Correct decoding requires that true travel per period stays within
//! ±2^31 subcounts (±32768 steps).

use stepgen_common::hal::consts::{MIN_POSITION_SCALE, SUBCOUNT_BITS, SUBCOUNTS_PER_STEP};

use crate::channel::Channel;
use crate::diag::{CorrectionKind, Diagnostics};

/// Signed displacement from `prev` to `raw` across a possible wrap.
///
/// Same result as a 33-bit subtraction corrected by ±2^32 whenever it
/// leaves the `i32` range.
#[inline]
pub fn wrap_delta(prev: u32, raw: u32) -> i32 {
    raw.wrapping_sub(prev) as i32
}

/// Reset a near-zero scale to ±1.0, keeping its sign.
#[inline]
pub fn sanitize_position_scale(scale: f64) -> (f64, Option<CorrectionKind>) {
    if scale.abs() < MIN_POSITION_SCALE {
        let corrected = if scale < 0.0 { -1.0 } else { 1.0 };
        (corrected, Some(CorrectionKind::PositionScaleTooSmall { corrected }))
    } else {
        (scale, None)
    }
}

/// Fold a fresh accumulator reading into `channel`.
///
/// Updates `counts` and `position_fb` and returns them.
pub fn decode(channel: &mut Channel, raw: u32, diags: &mut Diagnostics) -> (i32, f64) {
    let (scale, correction) = sanitize_position_scale(channel.params.position_scale);
    channel.params.position_scale = scale;
    diags.report(channel.index(), correction);

    channel.hw.accumulator = raw;
    let delta = wrap_delta(channel.prev_raw_accumulator, raw);
    channel.prev_raw_accumulator = raw;
    channel.subcounts += delta as i64;

    let counts = (channel.subcounts >> SUBCOUNT_BITS) as i32;
    let position_fb = (channel.subcounts as f64 / SUBCOUNTS_PER_STEP) / scale;

    channel.pins.counts = counts;
    channel.pins.position_fb = position_fb;
    (counts, position_fb)
}

// ─── Tests ──────────────────────────────────────────────────────────
