//! Corrections reported by the periodic path.
//!
//! Sanitizers return `(value, Option<CorrectionKind>)`; the group collects
//! the reports into a caller-owned [`Diagnostics`] buffer. Nothing on the
//! periodic path logs directly, the caller decides when to surface them.

use std::fmt;

use stepgen_common::consts::MAX_DIAGNOSTICS;
use tracing::warn;

use crate::timing::TimingField;

/// What was wrong and what it was corrected to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrectionKind {
    /// |position_scale| below the minimum, reset to ±1.0.
    PositionScaleTooSmall {
        /// Value written back.
        corrected: f64,
    },
    /// maxvel was negative, replaced by its absolute value.
    MaxvelNegative {
        /// Value written back.
        corrected: f64,
    },
    /// maxvel faster than the pulse timing allows, clipped.
    MaxvelAbovePhysical {
        /// Physical limit written back.
        limit: f64,
    },
    /// maxaccel was negative, replaced by its absolute value.
    MaxaccelNegative {
        /// Value written back.
        corrected: f64,
    },
    /// Timing parameter did not fit the 14-bit register.
    TimingClamped {
        /// Which parameter.
        field: TimingField,
        /// Back-computed parameter [ns].
        corrected_ns: u32,
    },
    /// step_type outside 0..=2, reset to step/dir.
    InvalidStepType {
        /// Rejected raw value.
        value: u32,
    },
}

/// One correction on one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Channel index.
    pub channel: usize,
    /// What happened.
    pub kind: CorrectionKind,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = self.channel;
        match self.kind {
            CorrectionKind::PositionScaleTooSmall { corrected } => write!(
                f,
                "stepgen.{ch:02}.position-scale is too close to 0, resetting to {corrected:.1}"
            ),
            CorrectionKind::MaxvelNegative { corrected } => write!(
                f,
                "stepgen.{ch:02}.maxvel < 0, setting to its absolute value ({corrected})"
            ),
            CorrectionKind::MaxvelAbovePhysical { limit } => write!(
                f,
                "stepgen.{ch:02}.maxvel is too big for current step timings & position-scale, clipping to {limit}"
            ),
            CorrectionKind::MaxaccelNegative { corrected } => write!(
                f,
                "stepgen.{ch:02}.maxaccel < 0, setting to its absolute value ({corrected})"
            ),
            CorrectionKind::TimingClamped {
                field,
                corrected_ns,
            } => write!(
                f,
                "stepgen.{ch:02} has invalid {}, resetting to max ({corrected_ns} ns)",
                field.name()
            ),
            CorrectionKind::InvalidStepType { value } => write!(
                f,
                "stepgen.{ch:02} has invalid step_type {value}, resetting to 0 (Step/Dir)"
            ),
        }
    }
}

/// Fixed-capacity correction buffer, filled on the periodic path.
///
/// When full, further corrections are counted but not stored.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: heapless::Vec<Correction, MAX_DIAGNOSTICS>,
    dropped: usize,
}

impl Diagnostics {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a correction.
    #[inline]
    pub fn push(&mut self, channel: usize, kind: CorrectionKind) {
        if self.entries.push(Correction { channel, kind }).is_err() {
            self.dropped += 1;
        }
    }

    /// Record the outcome of a sanitizer, if it corrected anything.
    #[inline]
    pub fn report(&mut self, channel: usize, kind: Option<CorrectionKind>) {
        if let Some(kind) = kind {
            self.push(channel, kind);
        }
    }

    /// Stored corrections, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Correction> {
        self.entries.iter()
    }

    /// Number of stored corrections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was corrected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.dropped == 0
    }

    /// Corrections lost because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }

    /// Emit every stored correction as a warning, then clear.
    pub fn flush(&mut self) {
        for correction in &self.entries {
            warn!(channel = correction.channel, "{}", correction);
        }
        if self.dropped > 0 {
            warn!(dropped = self.dropped, "Diagnostics buffer full, corrections dropped");
        }
        self.clear();
    }
}
