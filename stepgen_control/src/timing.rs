//! Timing register synchronization.
//!
//! Five per-channel registers hold pulse and direction timing in clock
//! cycles (14 bits) plus the step type. Each is paired with a shadow of
//! the parameter value last written; a register is rewritten only when
//! its parameter no longer matches the shadow.
//!
//! ```text
//! param ──(≠ shadow?)──► round(ns · clock / 1e9) ──► clamp 0x3FFF ──► write
//!                                                     │
//!                               param = 0x3FFF · 1e9 / clock (if clamped)
//! ```
//!
//! Shadows are updated from the corrected parameter, so hardware always
//! holds the clamped transform of the shadow.

use bitflags::bitflags;
use stepgen_common::hal::consts::{NS_PER_SEC, TIMING_REGISTER_MAX};
use stepgen_common::hal::types::{Register, RegisterMap, StepType};

use crate::channel::Channel;
use crate::diag::{CorrectionKind, Diagnostics};

/// Number of timing fields per channel.
pub const NUM_TIMING_FIELDS: usize = 5;

// ─── Fields ─────────────────────────────────────────────────────────

/// One shadowed timing parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingField {
    /// Direction setup time.
    DirSetup,
    /// Direction hold time.
    DirHold,
    /// Step pulse width.
    StepLen,
    /// Step pulse idle width.
    StepSpace,
    /// Output mode.
    StepType,
}

impl TimingField {
    /// Order of incremental writes.
    pub const ALL: [TimingField; NUM_TIMING_FIELDS] = [
        TimingField::DirSetup,
        TimingField::DirHold,
        TimingField::StepLen,
        TimingField::StepSpace,
        TimingField::StepType,
    ];

    /// Order of a forced resync (mode register first).
    pub const FORCE_ORDER: [TimingField; NUM_TIMING_FIELDS] = [
        TimingField::StepType,
        TimingField::DirSetup,
        TimingField::DirHold,
        TimingField::StepLen,
        TimingField::StepSpace,
    ];

    /// Register backing this field.
    pub const fn register(self) -> Register {
        match self {
            TimingField::DirSetup => Register::DirSetup,
            TimingField::DirHold => Register::DirHold,
            TimingField::StepLen => Register::PulseWidth,
            TimingField::StepSpace => Register::PulseIdleWidth,
            TimingField::StepType => Register::Mode,
        }
    }

    /// Parameter name.
    pub const fn name(self) -> &'static str {
        match self {
            TimingField::DirSetup => "dirsetup",
            TimingField::DirHold => "dirhold",
            TimingField::StepLen => "steplen",
            TimingField::StepSpace => "stepspace",
            TimingField::StepType => "step_type",
        }
    }

    const fn flag(self) -> TimingFields {
        match self {
            TimingField::DirSetup => TimingFields::DIR_SETUP,
            TimingField::DirHold => TimingFields::DIR_HOLD,
            TimingField::StepLen => TimingFields::STEP_LEN,
            TimingField::StepSpace => TimingFields::STEP_SPACE,
            TimingField::StepType => TimingFields::STEP_TYPE,
        }
    }

    fn param(self, channel: &Channel) -> u32 {
        let p = &channel.params;
        match self {
            TimingField::DirSetup => p.dirsetup,
            TimingField::DirHold => p.dirhold,
            TimingField::StepLen => p.steplen,
            TimingField::StepSpace => p.stepspace,
            TimingField::StepType => p.step_type,
        }
    }

    fn written(self, channel: &Channel) -> u32 {
        let w = &channel.written;
        match self {
            TimingField::DirSetup => w.dirsetup,
            TimingField::DirHold => w.dirhold,
            TimingField::StepLen => w.steplen,
            TimingField::StepSpace => w.stepspace,
            TimingField::StepType => w.step_type,
        }
    }

    /// Store the accepted parameter, its shadow and the register value.
    fn commit(self, channel: &mut Channel, param: u32, reg: u32) {
        let (p, w, hw) = (&mut channel.params, &mut channel.written, &mut channel.hw);
        match self {
            TimingField::DirSetup => {
                p.dirsetup = param;
                w.dirsetup = param;
                hw.dir_setup = reg;
            }
            TimingField::DirHold => {
                p.dirhold = param;
                w.dirhold = param;
                hw.dir_hold = reg;
            }
            TimingField::StepLen => {
                p.steplen = param;
                w.steplen = param;
                hw.pulse_width = reg;
            }
            TimingField::StepSpace => {
                p.stepspace = param;
                w.stepspace = param;
                hw.pulse_idle_width = reg;
            }
            TimingField::StepType => {
                p.step_type = param;
                w.step_type = param;
                hw.mode = reg;
            }
        }
    }
}

bitflags! {
    /// Set of timing fields whose parameter differs from its shadow.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimingFields: u8 {
        const DIR_SETUP  = 1 << 0;
        const DIR_HOLD   = 1 << 1;
        const STEP_LEN   = 1 << 2;
        const STEP_SPACE = 1 << 3;
        const STEP_TYPE  = 1 << 4;
    }
}

/// A single-register write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    /// Byte address.
    pub addr: u32,
    /// Word to write.
    pub value: u32,
}

// ─── Conversions ────────────────────────────────────────────────────

/// Clock cycles for `ns` at `clock_hz`, rounded to nearest.
#[inline]
pub fn ns_to_clocks(ns: u32, clock_hz: u32) -> u64 {
    (ns as f64 * clock_hz as f64 / NS_PER_SEC).round() as u64
}

/// Register value for a timing parameter.
///
/// Returns the value and, when it had to be clamped to `0x3FFF`, the
/// parameter back-computed from the clamped value.
pub fn clamp_timing(ns: u32, clock_hz: u32) -> (u32, Option<u32>) {
    let clocks = ns_to_clocks(ns, clock_hz);
    if clocks > TIMING_REGISTER_MAX as u64 {
        let corrected = (TIMING_REGISTER_MAX as f64 * NS_PER_SEC / clock_hz as f64).round() as u32;
        (TIMING_REGISTER_MAX, Some(corrected))
    } else {
        (clocks as u32, None)
    }
}

/// Valid step type for a raw value; out-of-range values become step/dir.
pub fn validate_step_type(raw: u32) -> (StepType, Option<CorrectionKind>) {
    match StepType::try_from(raw) {
        Ok(step_type) => (step_type, None),
        Err(value) => (StepType::StepDir, Some(CorrectionKind::InvalidStepType { value })),
    }
}

// ─── Sync ───────────────────────────────────────────────────────────

/// Fields of `channel` whose parameter differs from its shadow.
pub fn dirty_fields(channel: &Channel) -> TimingFields {
    TimingField::ALL
        .into_iter()
        .filter(|f| f.param(channel) != f.written(channel))
        .fold(TimingFields::empty(), |acc, f| acc | f.flag())
}

/// Recompute `field` unconditionally and update its shadow.
///
/// Returns the register value now owed to hardware.
pub fn update_field(
    channel: &mut Channel,
    field: TimingField,
    clock_hz: u32,
    diags: &mut Diagnostics,
) -> u32 {
    let raw = field.param(channel);
    let (param, reg) = match field {
        TimingField::StepType => {
            let (step_type, correction) = validate_step_type(raw);
            diags.report(channel.index(), correction);
            (step_type as u32, step_type as u32)
        }
        _ => match clamp_timing(raw, clock_hz) {
            (reg, Some(corrected_ns)) => {
                diags.push(channel.index(), CorrectionKind::TimingClamped { field, corrected_ns });
                (corrected_ns, reg)
            }
            (reg, None) => (raw, reg),
        },
    };
    field.commit(channel, param, reg);
    reg
}

/// Write command for `field` if its parameter changed since the last write.
pub fn sync_field(
    channel: &mut Channel,
    field: TimingField,
    map: &RegisterMap,
    clock_hz: u32,
    diags: &mut Diagnostics,
) -> Option<RegisterWrite> {
    if field.param(channel) == field.written(channel) {
        return None;
    }
    let value = update_field(channel, field, clock_hz, diags);
    Some(RegisterWrite {
        addr: map.channel_address(field.register(), channel.index()),
        value,
    })
}

/// Write commands for every changed field of `channel`, in register order.
///
/// All shadows are committed before the commands are returned. Callers that
/// issue each write as they go should call [`sync_field`] per field instead.
pub fn sync(
    channel: &mut Channel,
    map: &RegisterMap,
    clock_hz: u32,
    diags: &mut Diagnostics,
) -> heapless::Vec<RegisterWrite, NUM_TIMING_FIELDS> {
    let mut writes = heapless::Vec::new();
    for field in TimingField::ALL {
        if let Some(write) = sync_field(channel, field, map, clock_hz, diags) {
            // One slot per field.
            let _ = writes.push(write);
        }
    }
    writes
}

// ─── Tests ──────────────────────────────────────────────────────────
