//! Register identities, step/control modes and the module descriptor.

use crate::consts::MAX_CHANNELS;
use crate::hal::consts::{INSTANCE_STRIDE, NUM_REGISTERS};
use serde::{Deserialize, Serialize};

/// The ten registers of a step generator module, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    /// DDS phase increment (tram write region).
    StepRate = 0,
    /// 16.16 position accumulator (tram read region).
    Accumulator = 1,
    /// Output mode (step type).
    Mode = 2,
    /// Direction setup time, in clocks.
    DirSetup = 3,
    /// Direction hold time, in clocks.
    DirHold = 4,
    /// Step pulse width, in clocks.
    PulseWidth = 5,
    /// Step pulse idle width, in clocks.
    PulseIdleWidth = 6,
    /// Table sequence data (unused by the core).
    TableData = 7,
    /// Table sequence length (unused by the core).
    TableLength = 8,
    /// Master DDS enable, one per module.
    MasterDds = 9,
}

impl Register {
    /// All registers in layout order.
    pub const ALL: [Register; 10] = [
        Register::StepRate,
        Register::Accumulator,
        Register::Mode,
        Register::DirSetup,
        Register::DirHold,
        Register::PulseWidth,
        Register::PulseIdleWidth,
        Register::TableData,
        Register::TableLength,
        Register::MasterDds,
    ];

    /// Index `k` of this register inside the module.
    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Short name used in diagnostic dumps.
    pub const fn name(self) -> &'static str {
        match self {
            Register::StepRate => "step_rate",
            Register::Accumulator => "accumulator",
            Register::Mode => "mode",
            Register::DirSetup => "dir_setup_time",
            Register::DirHold => "dir_hold_time",
            Register::PulseWidth => "pulse_width",
            Register::PulseIdleWidth => "pulse_idle_width",
            Register::TableData => "table_sequence_data_setup",
            Register::TableLength => "table_sequence_length",
            Register::MasterDds => "master_dds",
        }
    }
}

/// Address calculator for one step generator module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    /// Address of register 0.
    pub base_address: u32,
    /// Byte distance between consecutive registers.
    pub register_stride: u32,
}

impl RegisterMap {
    /// Create a map from the descriptor's base address and stride.
    pub const fn new(base_address: u32, register_stride: u32) -> Self {
        Self {
            base_address,
            register_stride,
        }
    }

    /// Address of instance 0 in `reg`.
    #[inline]
    pub const fn address(&self, reg: Register) -> u32 {
        self.base_address + reg.index() * self.register_stride
    }

    /// Address of instance `index` in `reg`.
    #[inline]
    pub const fn channel_address(&self, reg: Register, index: usize) -> u32 {
        self.address(reg) + index as u32 * INSTANCE_STRIDE
    }

    /// One past the last byte any instance of any register can occupy.
    ///
    /// `None` when the module does not fit the 32-bit address space, in
    /// which case [`address`](Self::address) would overflow.
    pub fn end_address(&self) -> Option<u32> {
        let last_register = (NUM_REGISTERS as u32 - 1).checked_mul(self.register_stride)?;
        self.base_address
            .checked_add(last_register)?
            .checked_add(MAX_CHANNELS as u32 * INSTANCE_STRIDE)
    }

    /// Reverse lookup: which register and instance an address belongs to.
    ///
    /// Returns `None` for addresses outside the module or not word aligned.
    pub fn decode(&self, addr: u32) -> Option<(Register, usize)> {
        let offset = addr.checked_sub(self.base_address)?;
        if self.register_stride == 0 || offset % INSTANCE_STRIDE != 0 {
            return None;
        }
        let k = (offset / self.register_stride) as usize;
        let reg = *Register::ALL.get(k)?;
        let index = (offset % self.register_stride) / INSTANCE_STRIDE;
        Some((reg, index as usize))
    }
}

/// Output waveform produced by one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum StepType {
    /// Step + direction pins.
    #[default]
    StepDir = 0,
    /// Up / down count pins.
    UpDown = 1,
    /// Table driven phase outputs.
    Table = 2,
}

impl TryFrom<u32> for StepType {
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(StepType::StepDir),
            1 => Ok(StepType::UpDown),
            2 => Ok(StepType::Table),
            other => Err(other),
        }
    }
}

/// Controller selected by the `control_type` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Follow `position_cmd` with feedforward + error correction.
    #[default]
    Position,
    /// Follow `velocity_cmd` under the acceleration limit.
    Velocity,
}

impl From<bool> for ControlMode {
    /// Maps the `control_type` bit: false = position, true = velocity.
    fn from(bit: bool) -> Self {
        if bit {
            ControlMode::Velocity
        } else {
            ControlMode::Position
        }
    }
}

/// Self-description of a step generator module as reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module version (0 or 1).
    pub version: u8,
    /// Number of registers, must be 10.
    #[serde(default = "default_num_registers")]
    pub num_registers: u8,
    /// Distance between instances inside a register, must be 4.
    #[serde(default = "default_instance_stride")]
    pub instance_stride: u32,
    /// Per-instance register mask, must be 0x01FF.
    #[serde(default = "default_multiple_registers")]
    pub multiple_registers: u32,
    /// Step generator clock in Hz.
    pub clock_frequency_hz: u32,
    /// Address of the step rate register.
    pub base_address: u32,
    /// Distance between registers.
    pub register_stride: u32,
    /// Instances present in the firmware.
    pub instances: u8,
}

fn default_num_registers() -> u8 {
    crate::hal::consts::NUM_REGISTERS
}

fn default_instance_stride() -> u32 {
    INSTANCE_STRIDE
}

fn default_multiple_registers() -> u32 {
    crate::hal::consts::MULTIPLE_REGISTERS
}

impl ModuleDescriptor {
    /// Register map described by this module.
    pub const fn register_map(&self) -> RegisterMap {
        RegisterMap::new(self.base_address, self.register_stride)
    }
}

/// How many instances the driver should claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceRequest {
    /// Every instance the firmware offers.
    All,
    /// Exactly this many (0 disables the module).
    Count(usize),
}

impl TryFrom<i32> for InstanceRequest {
    type Error = i32;

    /// `-1` selects all instances, other negatives are rejected.
    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(InstanceRequest::All),
            n if n >= 0 => Ok(InstanceRequest::Count(n as usize)),
            other => Err(other),
        }
    }
}
