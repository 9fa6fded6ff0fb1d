//! # Step generator HAL binary
//!
//! Loads a board configuration, opens the register transport and runs the
//! periodic step generator loop until interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Run with the board file
//! stepgen_hal --config config/board.toml
//!
//! # Override the transport and stop after 5000 periods
//! stepgen_hal -c config/board.toml -t simulation --cycles 5000
//!
//! # Verbose JSON logging
//! stepgen_hal -c config/board.toml -v --json
//! ```

use clap::Parser;
use stepgen_common::consts::DEFAULT_CONFIG_PATH;
use stepgen_hal::{HalCore, TransportRegistry};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Step generator HAL - periodic driver for FPGA step generators
#[derive(Parser, Debug)]
#[command(name = "stepgen_hal")]
#[command(version)]
#[command(about = "Periodic step generator driver with pluggable register transports")]
#[command(long_about = None)]
struct Args {
    /// Path to board configuration file (board.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the transport named in the board file
    #[arg(short, long)]
    transport: Option<String>,

    /// Run this many periods without sleeping, then exit
    #[arg(long)]
    cycles: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("HAL startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is loaded before tracing so its log level can apply.
    let mut config = match HalCore::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(Level::INFO, args.json);
            return Err(e.into());
        }
    };

    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.into()
    };
    setup_tracing(level, args.json);

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if let Some(transport) = args.transport {
        info!("Transport from CLI: {}", transport);
        config.transport = transport;
    }

    let mut hal_core = HalCore::new(config, TransportRegistry::with_builtin())?;

    let running = hal_core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    hal_core.init()?;

    let result = match args.cycles {
        Some(n) => hal_core.run_cycles(n),
        None => hal_core.run(),
    };
    if let Err(e) = result {
        error!("Loop error: {}", e);
    }

    hal_core.shutdown()?;

    let stats = hal_core.stats();
    info!(
        "Step generator HAL shutdown complete ({} cycles, avg={}us, max={}us)",
        stats.cycle_count,
        stats.avg_cycle_time_us(),
        stats.max_cycle_time_us
    );
    Ok(())
}

/// Setup tracing subscriber.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
