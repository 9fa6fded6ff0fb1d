//! Construction, configuration, init and shutdown of `HalCore`.

use std::io::Write;
use std::path::Path;

use stepgen_common::config::ConfigError;
use stepgen_common::hal::transport::TransportError;
use stepgen_control::SetupError;
use stepgen_hal::{HalCore, HalError, TransportRegistry};
use tempfile::NamedTempFile;

use super::{BOARD, board, core};

#[test]
fn shipped_board_file_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/board.toml");
    let config = HalCore::load_config(&path).unwrap();
    assert_eq!(config.transport, "simulation");

    let mut core = HalCore::new(config, TransportRegistry::with_builtin()).unwrap();
    core.init().unwrap();
    core.run_cycles(10).unwrap();
    assert_eq!(core.group().len(), 4);
}

#[test]
fn load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "num_stepgens = 2\n{BOARD}").unwrap();

    let config = HalCore::load_config(file.path()).unwrap();
    let core = HalCore::new(config, TransportRegistry::with_builtin()).unwrap();
    assert_eq!(core.group().len(), 2);
    assert_eq!(core.period().as_micros(), 1000);
}

#[test]
fn missing_config_file() {
    let result = HalCore::load_config(Path::new("/nonexistent/board.toml"));
    assert!(matches!(
        result,
        Err(HalError::Config(ConfigError::FileNotFound(_)))
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = board("");
    config.period_us = 0;
    let result = HalCore::new(config, TransportRegistry::with_builtin());
    assert!(matches!(result, Err(HalError::Config(_))));
}

#[test]
fn more_instances_than_firmware_offers() {
    let mut config = board("");
    config.num_stepgens = 8;
    let result = HalCore::new(config, TransportRegistry::with_builtin());
    assert!(matches!(
        result,
        Err(HalError::Setup(SetupError::InsufficientInstances {
            requested: 8,
            available: 4
        }))
    ));
}

#[test]
fn unsupported_layout_is_rejected() {
    let mut config = board("");
    config.descriptor.num_registers = 9;
    let result = HalCore::new(config, TransportRegistry::with_builtin());
    assert!(matches!(
        result,
        Err(HalError::Setup(SetupError::UnsupportedLayout(_)))
    ));
}

#[test]
fn unknown_transport_fails_init() {
    let mut config = board("");
    config.transport = "pci".to_string();
    let mut core = HalCore::new(config, TransportRegistry::with_builtin()).unwrap();
    assert!(matches!(
        core.init(),
        Err(HalError::Transport(TransportError::NotFound(_)))
    ));
}

#[test]
fn cycles_require_init() {
    let mut core = HalCore::new(board(""), TransportRegistry::with_builtin()).unwrap();
    assert!(matches!(core.run_cycles(1), Err(HalError::InitFailed(_))));
    assert!(matches!(core.run(), Err(HalError::InitFailed(_))));
}

#[test]
fn init_pushes_channel_timing() {
    let core = core(
        r#"
[[channels]]
index = 2
steplen = 2000
stepspace = 3000
dirsetup = 500
dirhold = 700
step_type = 1
"#,
    );
    let ch = core.group().channel(2).unwrap();
    let hw = ch.registers();
    assert_eq!(hw.pulse_width, 100);
    assert_eq!(hw.pulse_idle_width, 150);
    assert_eq!(hw.dir_setup, 25);
    assert_eq!(hw.dir_hold, 35);
    assert_eq!(hw.mode, 1);
    assert_eq!(ch.written().stepspace, 3000);
}

#[test]
fn timing_change_between_cycles_is_synced() {
    let mut core = core("");
    core.run_cycles(1).unwrap();

    core.group_mut().channel_mut(3).unwrap().params.steplen = 4000;
    core.run_cycles(1).unwrap();

    let ch = core.group().channel(3).unwrap();
    assert_eq!(ch.registers().pulse_width, 200);
    assert_eq!(ch.written().steplen, 4000);
}

#[test]
fn shutdown_stops_every_channel() {
    let mut core = core(
        r#"
[[channels]]
index = 0
position_scale = 200.0
maxaccel = 0.0
steplen = 2000
stepspace = 2000
control_mode = "velocity"
velocity_cmd = -3.0
enable = true
"#,
    );
    core.run_cycles(10).unwrap();
    assert_ne!(core.group().channel(0).unwrap().registers().step_rate, 0);

    core.shutdown().unwrap();
    assert!(!core.running_flag().load(std::sync::atomic::Ordering::SeqCst));
    for ch in core.group().channels() {
        assert!(!ch.pins.enable);
        assert_eq!(ch.registers().step_rate, 0);
    }
}

#[test]
fn zero_instances_run_without_register_traffic() {
    let mut config = board("");
    config.num_stepgens = 0;
    let mut core = HalCore::new(config, TransportRegistry::with_builtin()).unwrap();
    core.init().unwrap();
    core.run_cycles(5).unwrap();
    assert!(core.group().is_empty());
    assert_eq!(core.stats().cycle_count, 5);
}
