//! HAL Core struct and periodic loop management.
//!
//! `HalCore` owns the board configuration, the channel group and the open
//! register transport, and runs one control period per cycle:
//!
//! ```text
//! advance ─► read accumulators ─► decode ─► control/encode ─► write rates ─► sync timing
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use stepgen_common::config::ConfigLoader;
use stepgen_common::hal::config::BoardConfig;
use stepgen_common::hal::transport::RegisterTransport;
use stepgen_control::{ChannelGroup, Diagnostics, GroupBuilder};
use tracing::{debug, info, warn};

use crate::error::HalError;
use crate::transport_registry::TransportRegistry;

/// HAL Core manages the transport, the channel group and the periodic loop.
pub struct HalCore {
    /// Board configuration
    config: BoardConfig,
    /// Available transports
    registry: TransportRegistry,
    /// Every claimed step generator instance
    group: ChannelGroup,
    /// Open transport (after `init`)
    transport: Option<Box<dyn RegisterTransport>>,
    /// Corrections collected during a cycle
    diags: Diagnostics,
    /// A timing write failed; rewrite every timing register next cycle
    resync_pending: bool,
    /// Running flag for loop control
    running: Arc<AtomicBool>,
    /// Control period from config
    period: Duration,
    /// Timing statistics
    stats: TimingStats,
}

/// Timing statistics for loop monitoring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimingStats {
    /// Number of cycles executed
    pub cycle_count: u64,
    /// Number of timing violations (cycle exceeded period)
    pub timing_violations: u64,
    /// Maximum observed cycle time
    pub max_cycle_time_us: u64,
    /// Sum of cycle times for average calculation
    pub total_cycle_time_us: u64,
    /// Cycles whose register I/O failed
    pub transport_errors: u64,
}

impl TimingStats {
    /// Average cycle time, 0 before the first cycle.
    pub fn avg_cycle_time_us(&self) -> u64 {
        if self.cycle_count > 0 {
            self.total_cycle_time_us / self.cycle_count
        } else {
            0
        }
    }

    fn record(&mut self, cycle_time_us: u64) {
        self.cycle_count += 1;
        self.total_cycle_time_us += cycle_time_us;
        if cycle_time_us > self.max_cycle_time_us {
            self.max_cycle_time_us = cycle_time_us;
        }
    }
}

impl HalCore {
    /// Create a new HalCore from a board configuration.
    ///
    /// Validates the configuration, checks the module descriptor, claims
    /// the requested instances and applies the per-channel settings.
    ///
    /// # Errors
    /// Returns error if validation or group setup fails.
    pub fn new(config: BoardConfig, registry: TransportRegistry) -> Result<Self, HalError> {
        stepgen_common::config::Validate::validate(&config)?;

        let mut builder = GroupBuilder::new(config.instance_request()?);
        builder.add_descriptor(config.descriptor)?;
        let mut group = builder.build()?;
        group.apply_config(&config.channels);

        let period = config.period();
        info!(
            "HalCore created: {} stepgens, period={}us, transport='{}'",
            group.len(),
            config.period_us,
            config.transport
        );

        Ok(Self {
            config,
            registry,
            group,
            transport: None,
            diags: Diagnostics::new(),
            resync_pending: false,
            running: Arc::new(AtomicBool::new(false)),
            period,
            stats: TimingStats::default(),
        })
    }

    /// Load and validate a board configuration from a TOML file.
    pub fn load_config(config_path: &Path) -> Result<BoardConfig, HalError> {
        let config = BoardConfig::load_validated(config_path)?;
        Ok(config)
    }

    /// Open the transport and bring the hardware in line with the channels.
    ///
    /// Rewrites every timing register, enables the DDS, then takes the
    /// first accumulator snapshot as the decoding origin.
    ///
    /// # Errors
    /// Returns error if the transport is unknown or register access fails.
    pub fn init(&mut self) -> Result<(), HalError> {
        info!("Initializing HalCore with transport '{}'...", self.config.transport);

        let mut transport = self
            .registry
            .create(&self.config.transport, &self.config.descriptor)?;
        info!("Opened transport: {}", transport.name());

        self.group.force_write(transport.as_mut(), &mut self.diags)?;
        self.group.read_accumulators(transport.as_mut())?;
        self.group.tram_init();
        self.diags.flush();
        self.group.log_module();

        self.transport = Some(transport);
        info!("HalCore initialized successfully");
        Ok(())
    }

    /// Run one control period.
    ///
    /// `elapsed` is the time since the previous cycle; the controllers use
    /// the configured period. After a failed timing write the next cycle
    /// forces a full timing resync before the incremental sync.
    ///
    /// # Errors
    /// Returns error if not initialized or register access fails.
    pub fn cycle(&mut self, elapsed: Duration) -> Result<(), HalError> {
        let transport = self
            .transport
            .as_deref_mut()
            .ok_or_else(|| HalError::InitFailed("Transport not initialized".to_string()))?;

        transport.advance(elapsed);
        self.group.read_accumulators(transport)?;
        self.group.process_tram_read(&mut self.diags);
        self.group.prepare_tram_write(self.period, &mut self.diags);
        self.group.write_step_rates(transport)?;

        if self.resync_pending {
            self.group.force_write(transport, &mut self.diags)?;
            self.resync_pending = false;
            info!("Timing registers resynchronized");
        }
        if let Err(e) = self.group.write(transport, &mut self.diags) {
            self.resync_pending = true;
            return Err(e.into());
        }

        if !self.diags.is_empty() {
            self.diags.flush();
        }
        Ok(())
    }

    /// Run exactly `n` cycles back to back, without sleeping.
    ///
    /// Each cycle advances the hardware by one nominal period.
    pub fn run_cycles(&mut self, n: u64) -> Result<(), HalError> {
        for _ in 0..n {
            let cycle_start = Instant::now();
            self.cycle(self.period)?;
            self.stats.record(cycle_start.elapsed().as_micros() as u64);
        }
        debug!("Ran {} cycles", n);
        Ok(())
    }

    /// Run the periodic loop.
    ///
    /// This method blocks until shutdown is requested via the running flag.
    ///
    /// # Errors
    /// Returns error if the core was not initialized.
    pub fn run(&mut self) -> Result<(), HalError> {
        if self.transport.is_none() {
            return Err(HalError::InitFailed("Transport not initialized".to_string()));
        }

        info!(
            "Starting HalCore loop (period={}us)...",
            self.period.as_micros()
        );
        self.running.store(true, Ordering::SeqCst);

        if detect_rt_mode() {
            info!("Running in real-time mode");
        } else {
            info!("Running in standard (non-RT) mode");
        }

        let mut last_cycle = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let elapsed = cycle_start.duration_since(last_cycle);
            last_cycle = cycle_start;

            if let Err(e) = self.cycle(elapsed) {
                self.stats.transport_errors += 1;
                if self.stats.transport_errors <= 10 || self.stats.transport_errors % 1000 == 0 {
                    warn!("Cycle #{} failed: {}", self.stats.cycle_count, e);
                }
            }

            let cycle_time_us = cycle_start.elapsed().as_micros() as u64;
            self.stats.record(cycle_time_us);

            if cycle_time_us > self.config.period_us as u64 {
                self.stats.timing_violations += 1;
                if self.stats.timing_violations <= 10 || self.stats.timing_violations % 1000 == 0 {
                    warn!(
                        "Timing violation #{}: cycle took {}us (target {}us)",
                        self.stats.timing_violations, cycle_time_us, self.config.period_us
                    );
                }
            }

            let busy = cycle_start.elapsed();
            if busy < self.period {
                std::thread::sleep(self.period - busy);
            }

            if self.stats.cycle_count % 1000 == 0 {
                debug!(
                    "Loop: {} cycles, avg={}us, max={}us, violations={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_time_us(),
                    self.stats.max_cycle_time_us,
                    self.stats.timing_violations
                );
            }
        }

        info!(
            "HalCore loop stopped after {} cycles (violations: {})",
            self.stats.cycle_count, self.stats.timing_violations
        );
        Ok(())
    }

    /// Stop the loop and bring every step generator to rest.
    pub fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);

        if let Some(transport) = self.transport.as_deref_mut() {
            for channel in self.group.channels_mut() {
                channel.pins.enable = false;
            }
            self.group.prepare_tram_write(self.period, &mut self.diags);
            self.group.write_step_rates(transport)?;
        }
        Ok(())
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// The channel group.
    pub fn group(&self) -> &ChannelGroup {
        &self.group
    }

    /// The channel group, for operator changes between cycles.
    pub fn group_mut(&mut self) -> &mut ChannelGroup {
        &mut self.group
    }

    /// Open transport, after `init`.
    pub fn transport_mut(&mut self) -> Option<&mut dyn RegisterTransport> {
        self.transport
            .as_deref_mut()
            .map(|t| t as &mut dyn RegisterTransport)
    }

    /// Whether the next cycle starts with a full timing resync.
    pub fn resync_pending(&self) -> bool {
        self.resync_pending
    }

    /// Configured control period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Get timing statistics.
    pub fn stats(&self) -> TimingStats {
        self.stats
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: sched_getscheduler(0) only queries the calling thread.
        let policy = unsafe { sched_getscheduler(0) };
        policy == SCHED_FIFO || policy == SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
