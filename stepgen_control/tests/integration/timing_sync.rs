//! Timing register traffic: incremental sync and forced resync.

use stepgen_common::prelude::*;
use stepgen_control::{ChannelGroup, CorrectionKind, Diagnostics};

use super::{RegisterFile, descriptor};

const MODE: u32 = 0x2200;
const DIR_SETUP: u32 = 0x2300;
const DIR_HOLD: u32 = 0x2400;
const PULSE_WIDTH: u32 = 0x2500;
const PULSE_IDLE: u32 = 0x2600;
const MASTER_DDS: u32 = 0x2900;

/// Transport whose link is down.
struct Unplugged;

impl RegisterTransport for Unplugged {
    fn name(&self) -> &'static str {
        "unplugged"
    }

    fn read(&mut self, _addr: u32, _buf: &mut [u8]) -> Result<(), TransportError> {
        Err(TransportError::Unavailable("cable".to_string()))
    }

    fn write(&mut self, _addr: u32, _data: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Unavailable("cable".to_string()))
    }
}

#[test]
fn first_write_syncs_everything_then_goes_quiet() {
    let mut group = ChannelGroup::new(&descriptor(2), 2).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();

    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 10);
    assert_eq!(regs.word(PULSE_WIDTH + 4), 0x3FFF);
    assert_eq!(regs.word(DIR_HOLD), 0x3FFF);

    regs.writes.clear();
    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 0);
    assert!(regs.writes.is_empty());
    assert!(diags.is_empty());
}

#[test]
fn changed_steplen_writes_one_register() {
    let mut group = ChannelGroup::new(&descriptor(2), 2).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    group.write(&mut regs, &mut diags).unwrap();
    regs.writes.clear();

    group.channel_mut(1).unwrap().params.steplen = 1000;
    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 1);
    assert_eq!(regs.writes, vec![(PULSE_WIDTH + 4, 4)]);
    assert_eq!(regs.word(PULSE_WIDTH + 4), 50);
}

#[test]
fn oversized_stepspace_is_clamped_and_back_computed() {
    let mut group = ChannelGroup::new(&descriptor(1), 1).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    group.channel_mut(0).unwrap().params.stepspace = 1_000_000;

    group.write(&mut regs, &mut diags).unwrap();

    assert_eq!(regs.word(PULSE_IDLE), 0x3FFF);
    let ch = group.channel(0).unwrap();
    assert_eq!(ch.params.stepspace, 327_660);
    assert_eq!(ch.written().stepspace, 327_660);
    let kinds: Vec<_> = diags.iter().map(|c| c.kind).collect();
    assert_eq!(kinds.len(), 1);
    assert!(matches!(
        kinds[0],
        CorrectionKind::TimingClamped {
            corrected_ns: 327_660,
            ..
        }
    ));
}

#[test]
fn force_write_uses_one_region_per_register_and_enables_dds() {
    let mut group = ChannelGroup::new(&descriptor(2), 2).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    group.channel_mut(0).unwrap().params.dirsetup = 200;
    group.channel_mut(1).unwrap().params.step_type = 1;

    group.force_write(&mut regs, &mut diags).unwrap();

    assert_eq!(
        regs.writes,
        vec![
            (MODE, 8),
            (DIR_SETUP, 8),
            (DIR_HOLD, 8),
            (PULSE_WIDTH, 8),
            (PULSE_IDLE, 8),
            (MASTER_DDS, 4),
        ]
    );
    assert_eq!(regs.word(MASTER_DDS), 0xFFFF_FFFF);
    assert_eq!(regs.word(DIR_SETUP), 10);
    assert_eq!(regs.word(MODE + 4), 1);

    regs.writes.clear();
    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 0);
}

#[test]
fn force_write_repeats_unconditionally() {
    let mut group = ChannelGroup::new(&descriptor(1), 1).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    group.force_write(&mut regs, &mut diags).unwrap();
    group.force_write(&mut regs, &mut diags).unwrap();
    assert_eq!(regs.writes.len(), 12);
}

#[test]
fn force_write_on_empty_group_is_silent() {
    let mut group = ChannelGroup::new(&descriptor(4), 0).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    group.force_write(&mut regs, &mut diags).unwrap();
    assert!(regs.writes.is_empty());
    assert_eq!(regs.word(MASTER_DDS), 0);
}

#[test]
fn invalid_step_type_is_written_as_step_dir() {
    let mut group = ChannelGroup::new(&descriptor(1), 1).unwrap();
    let mut regs = RegisterFile::new();
    regs.set_word(MODE, 0xAA);
    let mut diags = Diagnostics::new();
    group.channel_mut(0).unwrap().params.step_type = 3;

    group.force_write(&mut regs, &mut diags).unwrap();

    assert_eq!(regs.word(MODE), 0);
    assert_eq!(group.channel(0).unwrap().params.step_type, 0);
    assert_eq!(
        diags.iter().next().map(|c| c.kind),
        Some(CorrectionKind::InvalidStepType { value: 3 })
    );
}

#[test]
fn failed_write_is_reported_and_recovered_by_force_write() {
    let mut group = ChannelGroup::new(&descriptor(1), 1).unwrap();
    let mut diags = Diagnostics::new();
    let err = group.write(&mut Unplugged, &mut diags).unwrap_err();
    assert!(matches!(err, TransportError::Unavailable(_)));

    let mut regs = RegisterFile::new();
    group.force_write(&mut regs, &mut diags).unwrap();
    assert_eq!(regs.word(DIR_SETUP), 0x3FFF);
    assert_eq!(regs.word(PULSE_WIDTH), 0x3FFF);
    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 0);
}

#[test]
fn transient_failure_leaves_later_fields_dirty() {
    let mut group = ChannelGroup::new(&descriptor(2), 2).unwrap();
    let mut regs = Glitch::new(0);
    let mut diags = Diagnostics::new();

    let err = group.write(&mut regs, &mut diags).unwrap_err();
    assert!(matches!(err, TransportError::Unavailable(_)));
    assert_eq!(regs.attempted, vec![DIR_SETUP]);

    // Only the field whose write failed is lost; everything after it is
    // still owed to hardware.
    assert_eq!(group.write(&mut regs, &mut diags).unwrap(), 9);
    assert_eq!(
        regs.attempted[1..5],
        [DIR_HOLD, PULSE_WIDTH, PULSE_IDLE, MODE]
    );
    assert_eq!(regs.inner.word(DIR_HOLD), 0x3FFF);
    assert_eq!(regs.inner.word(PULSE_WIDTH), 0x3FFF);
    assert_eq!(regs.inner.word(PULSE_IDLE), 0x3FFF);
    assert_eq!(regs.inner.word(DIR_SETUP + 4), 0x3FFF);
    assert_eq!(regs.inner.word(DIR_SETUP), 0);

    group.force_write(&mut regs, &mut diags).unwrap();
    assert_eq!(regs.inner.word(DIR_SETUP), 0x3FFF);
}

/// Register file whose link drops for exactly one write.
struct Glitch {
    inner: RegisterFile,
    /// Index of the write that fails.
    fail_at: usize,
    /// Address of every write attempted, failed or not.
    attempted: Vec<u32>,
}

impl Glitch {
    fn new(fail_at: usize) -> Self {
        Self {
            inner: RegisterFile::new(),
            fail_at,
            attempted: Vec::new(),
        }
    }
}

impl RegisterTransport for Glitch {
    fn name(&self) -> &'static str {
        "glitch"
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), TransportError> {
        self.inner.read(addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), TransportError> {
        self.attempted.push(addr);
        if self.attempted.len() == self.fail_at + 1 {
            return Err(TransportError::Unavailable("glitch".to_string()));
        }
        self.inner.write(addr, data)
    }
}
