//! Whole control periods: decode, control, encode, ship step rates.

use std::time::Duration;

use stepgen_common::prelude::*;
use stepgen_control::{ChannelGroup, Diagnostics};

use super::{RegisterFile, descriptor};

const STEP_RATE: u32 = 0x2000;
const T: Duration = Duration::from_millis(1);

fn run_period(group: &mut ChannelGroup, regs: &mut RegisterFile, diags: &mut Diagnostics) {
    group.read_accumulators(regs).unwrap();
    group.process_tram_read(diags);
    group.prepare_tram_write(T, diags);
    group.write_step_rates(regs).unwrap();
}

/// One enabled channel with fast pulse timing and no accel limit.
fn single_channel(mode: ControlMode) -> (ChannelGroup, RegisterFile) {
    let mut group = ChannelGroup::new(&descriptor(1), 1).unwrap();
    let mut regs = RegisterFile::new();
    group.apply_config(&[ChannelConfig {
        index: 0,
        steplen: Some(100),
        stepspace: Some(100),
        maxaccel: Some(0.0),
        control_mode: Some(mode),
        enable: Some(true),
        ..Default::default()
    }]);
    group.read_accumulators(&mut regs).unwrap();
    group.tram_init();
    (group, regs)
}

#[test]
fn position_step_reaches_feedforward_in_one_period() {
    let (mut group, mut regs) = single_channel(ControlMode::Position);
    let mut diags = Diagnostics::new();
    let ch = group.channel_mut(0).unwrap();
    ch.params.position_scale = 1000.0;
    ch.pins.position_cmd = 1.0;

    run_period(&mut group, &mut regs, &mut diags);

    let ch = group.channel(0).unwrap();
    assert!((ch.pins.velocity_fb - 1000.0).abs() < 1e-9);
    // 1e6 steps/s at 50 MHz
    assert_eq!(regs.word(STEP_RATE), 85_899_345);
    assert_eq!(ch.telemetry.step_rate, 85_899_345);
    assert!(diags.is_empty());
}

#[test]
fn disable_span_zeroes_rate_and_reenable_resumes() {
    let (mut group, mut regs) = single_channel(ControlMode::Velocity);
    let mut diags = Diagnostics::new();
    group.channel_mut(0).unwrap().pins.velocity_cmd = 10.0;

    run_period(&mut group, &mut regs, &mut diags);
    let enabled_rate = regs.word(STEP_RATE);
    assert_eq!(enabled_rate, 858);

    group.channel_mut(0).unwrap().pins.enable = false;
    for _ in 0..3 {
        run_period(&mut group, &mut regs, &mut diags);
        assert_eq!(regs.word(STEP_RATE), 0);
    }

    group.channel_mut(0).unwrap().pins.enable = true;
    run_period(&mut group, &mut regs, &mut diags);
    assert_eq!(regs.word(STEP_RATE), enabled_rate);
}

#[test]
fn acceleration_ramp_continues_after_reenable() {
    let (mut group, mut regs) = single_channel(ControlMode::Velocity);
    let mut diags = Diagnostics::new();
    let ch = group.channel_mut(0).unwrap();
    ch.params.maxaccel = 1000.0;
    ch.pins.velocity_cmd = 10.0;

    for _ in 0..3 {
        run_period(&mut group, &mut regs, &mut diags);
    }
    assert!((group.channel(0).unwrap().pins.velocity_fb - 3.0).abs() < 1e-9);

    group.channel_mut(0).unwrap().pins.enable = false;
    run_period(&mut group, &mut regs, &mut diags);
    assert!((group.channel(0).unwrap().pins.velocity_fb - 3.0).abs() < 1e-9);

    group.channel_mut(0).unwrap().pins.enable = true;
    run_period(&mut group, &mut regs, &mut diags);
    assert!((group.channel(0).unwrap().pins.velocity_fb - 4.0).abs() < 1e-9);
}

#[test]
fn command_jump_while_disabled_shows_up_as_feedforward() {
    let (mut group, mut regs) = single_channel(ControlMode::Position);
    let mut diags = Diagnostics::new();
    group.channel_mut(0).unwrap().params.maxaccel = 1.0;
    run_period(&mut group, &mut regs, &mut diags);

    let ch = group.channel_mut(0).unwrap();
    ch.pins.enable = false;
    ch.pins.position_cmd = 5.0;
    for _ in 0..3 {
        run_period(&mut group, &mut regs, &mut diags);
    }
    assert_eq!(group.channel(0).unwrap().old_position_cmd(), 0.0);

    group.channel_mut(0).unwrap().pins.enable = true;
    run_period(&mut group, &mut regs, &mut diags);
    let ch = group.channel(0).unwrap();
    assert!((ch.telemetry.ff_vel - 5000.0).abs() < 1e-6);
    assert_eq!(ch.old_position_cmd(), 5.0);
    // Rate limited by maxaccel: 1.0 units/s² over 1 ms
    assert!((ch.pins.velocity_fb - 0.001).abs() < 1e-12);
}

#[test]
fn velocity_never_exceeds_maxvel() {
    for mode in [ControlMode::Position, ControlMode::Velocity] {
        for maxvel in [0.5, 3.0, 40.0] {
            for cmd in [-1.0e4, -2.0, 0.3, 1.0e4] {
                let (mut group, mut regs) = single_channel(mode);
                let mut diags = Diagnostics::new();
                let ch = group.channel_mut(0).unwrap();
                ch.params.maxvel = maxvel;
                ch.pins.position_cmd = cmd;
                ch.pins.velocity_cmd = cmd;

                for _ in 0..3 {
                    run_period(&mut group, &mut regs, &mut diags);
                    let v = group.channel(0).unwrap().pins.velocity_fb;
                    assert!(v.abs() <= maxvel, "{mode:?} maxvel={maxvel} cmd={cmd}: {v}");
                }
            }
        }
    }
}

#[test]
fn channels_are_independent_in_one_region() {
    let mut group = ChannelGroup::new(&descriptor(3), 3).unwrap();
    let mut regs = RegisterFile::new();
    let mut diags = Diagnostics::new();
    for (i, ch) in group.channels_mut().iter_mut().enumerate() {
        ch.params.steplen = 100;
        ch.params.stepspace = 100;
        ch.params.maxaccel = 0.0;
        ch.pins.control_mode = ControlMode::Velocity;
        ch.pins.velocity_cmd = -10.0 * (i as f64 + 1.0);
        ch.pins.enable = i != 1;
    }

    run_period(&mut group, &mut regs, &mut diags);

    assert_eq!(regs.word(STEP_RATE) as i32, -858);
    assert_eq!(regs.word(STEP_RATE + 4), 0);
    assert_eq!(regs.word(STEP_RATE + 8) as i32, -2576);
    // one region read + one region write
    assert_eq!(regs.reads, 1);
    assert_eq!(regs.writes, vec![(STEP_RATE, 12)]);
}
