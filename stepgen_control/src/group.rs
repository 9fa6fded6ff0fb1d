//! The channel group: every claimed instance of one step generator module.
//!
//! A period runs in this order:
//!
//! | Step | Method | Transport |
//! |------|--------|-----------|
//! | 1 | [`ChannelGroup::read_accumulators`] | one region read |
//! | 2 | [`ChannelGroup::process_tram_read`] | none |
//! | 3 | [`ChannelGroup::prepare_tram_write`] | none |
//! | 4 | [`ChannelGroup::write_step_rates`] | one region write |
//! | 5 | [`ChannelGroup::write`] | one word per changed timing field |
//!
//! [`ChannelGroup::force_write`] rewrites every timing register and the
//! master DDS enable after (re)configuration.

use std::time::Duration;

use stepgen_common::consts::MAX_CHANNELS;
use stepgen_common::hal::config::ChannelConfig;
use stepgen_common::hal::consts::MASTER_ENABLE_VALUE;
use stepgen_common::hal::transport::{RegisterTransport, TransportError};
use stepgen_common::hal::types::{ModuleDescriptor, Register, RegisterMap};
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelState};
use crate::control;
use crate::decode::decode;
use crate::diag::Diagnostics;
use crate::encode::encode;
use crate::error::SetupError;
use crate::timing::{self, TimingField};

/// Owned state of every instance plus the module constants.
#[derive(Debug, Clone)]
pub struct ChannelGroup {
    version: u8,
    clock_frequency_hz: u32,
    map: RegisterMap,
    channels: Vec<Channel>,
    /// Scratch words for region transfers.
    region: [u32; MAX_CHANNELS],
}

impl ChannelGroup {
    /// Group of `count` power-on channels for `descriptor`.
    pub fn new(descriptor: &ModuleDescriptor, count: usize) -> Result<Self, SetupError> {
        if descriptor.clock_frequency_hz == 0 {
            return Err(SetupError::ZeroClock);
        }
        if count > MAX_CHANNELS {
            return Err(SetupError::TooManyInstances {
                requested: count,
                max: MAX_CHANNELS,
            });
        }

        let clock = descriptor.clock_frequency_hz;
        Ok(Self {
            version: descriptor.version,
            clock_frequency_hz: clock,
            map: descriptor.register_map(),
            channels: (0..count).map(|i| Channel::new(i, clock)).collect(),
            region: [0; MAX_CHANNELS],
        })
    }

    /// Group for a board without a step generator module.
    pub fn empty() -> Self {
        Self {
            version: 0,
            clock_frequency_hz: 0,
            map: RegisterMap::new(0, 0),
            channels: Vec::new(),
            region: [0; MAX_CHANNELS],
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Module version from the descriptor.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Step generator clock [Hz].
    pub fn clock_frequency_hz(&self) -> u32 {
        self.clock_frequency_hz
    }

    /// Step generator clock [MHz].
    pub fn clock_frequency_mhz(&self) -> f64 {
        self.clock_frequency_hz as f64 / 1e6
    }

    /// Register addresses of the module.
    pub fn register_map(&self) -> &RegisterMap {
        &self.map
    }

    /// Number of claimed instances.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True when no instance is claimed.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// All channels, by index.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// All channels, mutable (operator interface).
    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    /// Channel `index`, if claimed.
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Channel `index`, mutable.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    /// Apply per-channel configuration entries.
    pub fn apply_config(&mut self, configs: &[ChannelConfig]) {
        for config in configs {
            match self.channels.get_mut(config.index) {
                Some(channel) => channel.apply_config(config),
                None => warn!(
                    "Ignoring config for stepgen.{:02}: only {} instances claimed",
                    config.index,
                    self.channels.len()
                ),
            }
        }
    }

    // ─── Periodic path ──────────────────────────────────────────────

    /// Fetch every accumulator in one region read.
    pub fn read_accumulators(
        &mut self,
        transport: &mut dyn RegisterTransport,
    ) -> Result<(), TransportError> {
        let n = self.channels.len();
        if n == 0 {
            return Ok(());
        }
        let words = &mut self.region[..n];
        transport.read_region(self.map.address(Register::Accumulator), words)?;
        for (channel, raw) in self.channels.iter_mut().zip(words.iter()) {
            channel.hw.accumulator = *raw;
        }
        Ok(())
    }

    /// Start decoding from the accumulators just read and the current
    /// position commands. Call once after the first region read.
    pub fn tram_init(&mut self) {
        for channel in &mut self.channels {
            channel.resync_accumulator();
            channel.resync_position_cmd();
        }
    }

    /// Decode the accumulators into `counts` and `position_fb`.
    pub fn process_tram_read(&mut self, diags: &mut Diagnostics) {
        for channel in &mut self.channels {
            let raw = channel.hw.accumulator;
            decode(channel, raw, diags);
        }
    }

    /// Run the controllers and encode the step-rate registers.
    pub fn prepare_tram_write(&mut self, period: Duration, diags: &mut Diagnostics) {
        let period_s = period.as_secs_f64();
        for channel in &mut self.channels {
            match channel.state() {
                ChannelState::Disabled => channel.hw.step_rate = 0,
                ChannelState::Enabled => {
                    control::compute(channel, period_s, diags);
                    let rate = encode(channel, self.clock_frequency_hz);
                    channel.hw.step_rate = rate;
                    channel.telemetry.step_rate = rate as i32;
                }
            }
        }
    }

    /// Ship every step-rate register in one region write.
    pub fn write_step_rates(
        &mut self,
        transport: &mut dyn RegisterTransport,
    ) -> Result<(), TransportError> {
        let n = self.channels.len();
        if n == 0 {
            return Ok(());
        }
        for (slot, channel) in self.region.iter_mut().zip(&self.channels) {
            *slot = channel.hw.step_rate;
        }
        transport.write_region(self.map.address(Register::StepRate), &self.region[..n])
    }

    /// Write every timing register whose parameter changed.
    ///
    /// Each shadow is committed right before its own register write, so a
    /// transport error loses at most the field being written; the fields
    /// after it stay dirty for the next call. Returns the number of
    /// register writes issued.
    pub fn write(
        &mut self,
        transport: &mut dyn RegisterTransport,
        diags: &mut Diagnostics,
    ) -> Result<usize, TransportError> {
        let mut issued = 0;
        for channel in &mut self.channels {
            for field in TimingField::ALL {
                let Some(write) =
                    timing::sync_field(channel, field, &self.map, self.clock_frequency_hz, diags)
                else {
                    continue;
                };
                transport.write_u32(write.addr, write.value)?;
                issued += 1;
            }
        }
        Ok(issued)
    }

    /// Recompute and rewrite all timing registers, then enable the DDS.
    ///
    /// Does nothing for an empty group.
    pub fn force_write(
        &mut self,
        transport: &mut dyn RegisterTransport,
        diags: &mut Diagnostics,
    ) -> Result<(), TransportError> {
        let n = self.channels.len();
        if n == 0 {
            return Ok(());
        }

        for field in TimingField::FORCE_ORDER {
            for (slot, channel) in self.region.iter_mut().zip(self.channels.iter_mut()) {
                *slot = timing::update_field(channel, field, self.clock_frequency_hz, diags);
            }
            transport.write_region(self.map.address(field.register()), &self.region[..n])?;
        }

        transport.write_u32(self.map.address(Register::MasterDds), MASTER_ENABLE_VALUE)?;
        debug!("Forced write of {} stepgen instances", n);
        Ok(())
    }

    // ─── Diagnostics ────────────────────────────────────────────────

    /// Dump the module layout and every instance's registers.
    pub fn log_module(&self) {
        info!("StepGen: {}", self.channels.len());
        if self.channels.is_empty() {
            return;
        }
        info!(
            "    clock_frequency: {} Hz ({:.3} MHz)",
            self.clock_frequency_hz,
            self.clock_frequency_mhz()
        );
        info!("    version: {}", self.version);
        for reg in Register::ALL {
            info!("    {}_addr: 0x{:04X}", reg.name(), self.map.address(reg));
        }
        for channel in &self.channels {
            let hw = channel.registers();
            let p = &channel.params;
            info!("    instance {}:", channel.index());
            info!("        enable = {}", channel.pins.enable);
            info!("        hw:");
            info!("            step_rate = 0x{:08X}", hw.step_rate);
            info!("            accumulator = 0x{:08X}", hw.accumulator);
            info!("            mode = 0x{:08X}", hw.mode);
            info!("            dir_setup_time = 0x{:08X} ({} ns)", hw.dir_setup, p.dirsetup);
            info!("            dir_hold_time = 0x{:08X} ({} ns)", hw.dir_hold, p.dirhold);
            info!("            pulse_width = 0x{:08X} ({} ns)", hw.pulse_width, p.steplen);
            info!("            pulse_idle_width = 0x{:08X} ({} ns)", hw.pulse_idle_width, p.stepspace);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
