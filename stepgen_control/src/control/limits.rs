//! Velocity and acceleration limits.
//!
//! Sanitizers return the corrected value and the correction, if any.

use stepgen_common::hal::consts::NS_PER_SEC;

use crate::diag::CorrectionKind;

/// Fastest velocity the pulse timing can produce [units/s].
///
/// ```text
/// physical_maxvel = (1e9 / (steplen + stepspace)) / |position_scale|
/// ```
///
/// Zero total pulse time yields `+inf` (no timing limit).
#[inline]
pub fn physical_maxvel(steplen_ns: u32, stepspace_ns: u32, position_scale: f64) -> f64 {
    let min_ns_per_step = steplen_ns as f64 + stepspace_ns as f64;
    (NS_PER_SEC / min_ns_per_step) / position_scale.abs()
}

/// Negative maxvel becomes its absolute value.
#[inline]
pub fn sanitize_maxvel(maxvel: f64) -> (f64, Option<CorrectionKind>) {
    if maxvel < 0.0 {
        let corrected = maxvel.abs();
        (corrected, Some(CorrectionKind::MaxvelNegative { corrected }))
    } else {
        (maxvel, None)
    }
}

/// maxvel above the physical limit is clipped to it.
#[inline]
pub fn clip_maxvel(maxvel: f64, physical: f64) -> (f64, Option<CorrectionKind>) {
    if maxvel > physical {
        (physical, Some(CorrectionKind::MaxvelAbovePhysical { limit: physical }))
    } else {
        (maxvel, None)
    }
}

/// Negative maxaccel becomes its absolute value.
#[inline]
pub fn sanitize_maxaccel(maxaccel: f64) -> (f64, Option<CorrectionKind>) {
    if maxaccel < 0.0 {
        let corrected = maxaccel.abs();
        (corrected, Some(CorrectionKind::MaxaccelNegative { corrected }))
    } else {
        (maxaccel, None)
    }
}

/// Limit applied this period: maxvel when set, else the physical limit.
#[inline]
pub fn effective_maxvel(maxvel: f64, physical: f64) -> f64 {
    if maxvel == 0.0 { physical } else { maxvel }
}

/// Clamp `target` to `current ± maxaccel * period` when `maxaccel > 0`.
#[inline]
pub fn rate_limit(target: f64, current: f64, maxaccel: f64, period_s: f64) -> f64 {
    if maxaccel > 0.0 {
        let step = maxaccel * period_s;
        target.min(current + step).max(current - step)
    } else {
        target
    }
}

/// Clamp `velocity` to `±limit`.
#[inline]
pub fn clamp_velocity(velocity: f64, limit: f64) -> f64 {
    velocity.min(limit).max(-limit)
}
