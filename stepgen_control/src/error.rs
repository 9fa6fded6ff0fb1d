//! Setup errors.
//!
//! Only building a [`ChannelGroup`](crate::group::ChannelGroup) can fail.
//! Once a group exists, the periodic path corrects bad parameters in place
//! and has no error exits.

use thiserror::Error;

/// Errors raised while validating a module descriptor or sizing a group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Descriptor shape this driver does not understand.
    #[error("unsupported step generator module layout: {0}")]
    UnsupportedLayout(String),

    /// A second descriptor was offered for an already configured module.
    #[error("found duplicate step generator module descriptor, ignoring")]
    DuplicateDescriptor,

    /// More instances requested than the firmware provides.
    #[error("config requests {requested} step generators, but only {available} are available")]
    InsufficientInstances {
        /// Instances asked for in the configuration.
        requested: usize,
        /// Instances advertised by the descriptor.
        available: usize,
    },

    /// Instance count above the fixed real-time buffer capacity.
    #[error("{requested} step generators exceeds the limit of {max}")]
    TooManyInstances {
        /// Instances that would have been claimed.
        requested: usize,
        /// Compile-time limit.
        max: usize,
    },

    /// Descriptor reports a zero step generator clock.
    #[error("step generator clock frequency is zero")]
    ZeroClock,
}
