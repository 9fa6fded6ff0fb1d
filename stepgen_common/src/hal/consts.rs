//! Step generator register layout and fixed-point constants.
//!
//! The FPGA exposes ten word-registers per step generator group, each one
//! `register_stride` bytes apart, with one 32-bit slot per instance inside
//! every register.

use static_assertions::const_assert;

/// Number of registers in a step generator module.
pub const NUM_REGISTERS: u8 = 10;

/// Byte distance between two instances inside one register.
pub const INSTANCE_STRIDE: u32 = 4;

/// Bitmask of registers that have one slot per instance (registers 0..=8).
pub const MULTIPLE_REGISTERS: u32 = 0x01FF;

/// Descriptor versions understood by this driver.
pub const SUPPORTED_VERSIONS: [u8; 2] = [0, 1];

/// Largest value the mode and timing registers can hold (14 bits).
pub const TIMING_REGISTER_MAX: u32 = 0x3FFF;

/// Value written to the master DDS register on forced resync.
pub const MASTER_ENABLE_VALUE: u32 = 0xFFFF_FFFF;

/// Step type shadow before anything was written; never a valid step type.
pub const STEP_TYPE_UNWRITTEN: u32 = 0xFFFF_FFFF;

/// Fractional bits of the accumulator (16.16 fixed point).
pub const SUBCOUNT_BITS: u32 = 16;

/// Subcounts per physical step.
pub const SUBCOUNTS_PER_STEP: f64 = (1u64 << SUBCOUNT_BITS) as f64;

/// Full range of the phase accumulator, 2^32.
pub const PHASE_RANGE: f64 = 4_294_967_296.0;

/// Position scales closer to zero than this are replaced with ±1.0.
pub const MIN_POSITION_SCALE: f64 = 1e-6;

/// Nanoseconds per second.
pub const NS_PER_SEC: f64 = 1e9;

const_assert!(NUM_REGISTERS == 10);
const_assert!(MULTIPLE_REGISTERS == (1 << (NUM_REGISTERS - 1)) - 1);
const_assert!(TIMING_REGISTER_MAX < (1 << 14));
const_assert!(SUBCOUNT_BITS < 32);
