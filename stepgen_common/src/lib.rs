//! Step generator common library
//!
//! Shared constants, configuration loading and the register transport
//! interface used by every crate of the step generator workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide limits and default paths
//! - [`config`] - TOML loading trait, log level, shared service config
//! - [`hal`] - Register layout, board/channel config, transport trait
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use stepgen_common::prelude::*;
//!
//! let map = RegisterMap::new(0x2000, 0x100);
//! assert_eq!(map.channel_address(Register::Mode, 1), 0x2204);
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
