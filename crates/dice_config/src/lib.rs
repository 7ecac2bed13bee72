//! Parsing and validation of `dice.toml` simulator settings.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults the simulator was tuned with (64-load fan-out ceiling, 128-entry
//! per-chip queues, 64 subcycles, 2.5 ms run slices).

#![warn(missing_docs)]

pub mod duration;
pub mod error;
pub mod loader;
pub mod types;

pub use duration::{parse_duration_ps, PS_PER_MS, PS_PER_NS, PS_PER_S, PS_PER_US};
pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
