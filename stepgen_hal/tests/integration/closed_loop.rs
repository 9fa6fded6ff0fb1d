//! Controller, encoder and simulated DDS running together.

use super::{T, core};

const VELOCITY_CHANNEL: &str = r#"
[[channels]]
index = 0
position_scale = 200.0
maxaccel = 0.0
steplen = 2000
stepspace = 2000
control_mode = "velocity"
velocity_cmd = 10.0
enable = true
"#;

#[test]
fn velocity_mode_moves_at_commanded_rate() {
    let mut core = core(VELOCITY_CHANNEL);
    core.run_cycles(1000).unwrap();

    // The first period runs before any rate was written: 999 periods of
    // motion, slightly short because the phase increment truncates.
    let ch = core.group().channel(0).unwrap();
    assert!((ch.pins.position_fb - 9.99).abs() < 1e-3, "{}", ch.pins.position_fb);
    assert_eq!(ch.pins.counts, 1997);
    assert_eq!(ch.pins.velocity_fb, 10.0);
    assert_eq!(ch.registers().step_rate, 171_798);
    assert_eq!(core.stats().cycle_count, 1000);
}

#[test]
fn velocity_mode_ramps_under_maxaccel() {
    let mut core = core(&VELOCITY_CHANNEL.replace("maxaccel = 0.0", "maxaccel = 100.0"));

    core.run_cycles(50).unwrap();
    let v = core.group().channel(0).unwrap().pins.velocity_fb;
    assert!((v - 5.0).abs() < 1e-9, "{v}");

    core.run_cycles(950).unwrap();
    let ch = core.group().channel(0).unwrap();
    assert_eq!(ch.pins.velocity_fb, 10.0);
    // 0.1 s of ramp costs half the distance: 10 · (0.999 − 0.05)
    assert!((ch.pins.position_fb - 9.495).abs() < 1e-3, "{}", ch.pins.position_fb);
}

#[test]
fn position_mode_settles_on_command() {
    let mut core = core(
        r#"
[[channels]]
index = 0
position_scale = 200.0
maxvel = 50.0
maxaccel = 500.0
steplen = 2000
stepspace = 2000
position_cmd = 1.0
enable = true

[[channels]]
index = 1
position_scale = -200.0
maxvel = 50.0
maxaccel = 500.0
steplen = 2000
stepspace = 2000
position_cmd = -2.0
enable = true
"#,
    );
    core.run_cycles(2000).unwrap();

    let x = core.group().channel(0).unwrap();
    let y = core.group().channel(1).unwrap();
    assert!((x.pins.position_fb - 1.0).abs() < 1e-4, "{}", x.pins.position_fb);
    assert!((y.pins.position_fb + 2.0).abs() < 1e-4, "{}", y.pins.position_fb);
    assert!(x.pins.velocity_fb.abs() < 1e-3);
    assert!(y.pins.velocity_fb.abs() < 1e-3);
    // Reversed scale drives the counts the other way.
    assert_eq!(x.pins.counts, 199);
    assert_eq!(y.pins.counts, 399);
}

#[test]
fn position_mode_tracks_moving_command() {
    let mut core = core(
        r#"
[[channels]]
index = 0
position_scale = 200.0
maxvel = 50.0
maxaccel = 500.0
steplen = 2000
stepspace = 2000
enable = true
"#,
    );

    for i in 1..=1000 {
        core.group_mut().channel_mut(0).unwrap().pins.position_cmd = 5.0 * i as f64 * T;
        core.run_cycles(1).unwrap();
    }

    let ch = core.group().channel(0).unwrap();
    // Feedback trails the command by the period it took to read it back.
    let lag = ch.pins.position_cmd - ch.pins.position_fb;
    assert!(lag > 0.0 && lag < 0.006, "{lag}");
    assert!((ch.pins.velocity_fb - 5.0).abs() < 1e-3, "{}", ch.pins.velocity_fb);
    assert!((ch.telemetry.ff_vel - 5.0).abs() < 1e-6);
}

#[test]
fn disabled_channel_holds_still() {
    let mut core = core(&VELOCITY_CHANNEL.replace("enable = true", "enable = false"));
    core.run_cycles(100).unwrap();

    let ch = core.group().channel(0).unwrap();
    assert_eq!(ch.registers().step_rate, 0);
    assert_eq!(ch.pins.position_fb, 0.0);
    assert_eq!(ch.subcounts(), 0);
}
