//! # Step generator control core
//!
//! Per-period control of FPGA step generators. Each period the host:
//!
//! 1. reads every instance's accumulator in one region read,
//! 2. decodes it into position feedback ([`decode`]),
//! 3. runs the position or velocity controller ([`control`]),
//! 4. encodes the resulting velocity into a DDS phase increment ([`encode`]),
//! 5. writes every step rate in one region write.
//!
//! Timing registers (pulse width, pulse space, direction setup/hold, mode)
//! are synchronized separately by [`timing`], only when a parameter changed.
//!
//! ## Zero-Allocation Periodic Path
//!
//! All channel state is allocated once when the [`group::ChannelGroup`] is
//! built. The periodic functions never allocate, never block and never fail:
//! out-of-range parameters are corrected in place and reported through a
//! fixed-capacity [`diag::Diagnostics`] buffer owned by the caller.

pub mod channel;
pub mod control;
pub mod decode;
pub mod diag;
pub mod encode;
pub mod error;
pub mod group;
pub mod setup;
pub mod timing;

pub use channel::{Channel, ChannelState};
pub use diag::{Correction, CorrectionKind, Diagnostics};
pub use error::SetupError;
pub use group::ChannelGroup;
pub use setup::GroupBuilder;
