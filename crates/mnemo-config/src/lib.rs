//! Memory store configuration (`~/.config/mnemo/config.toml`).

pub mod config;
pub mod paths;

pub use config::{DEFAULT_MAX_RECALL_RESULTS, MemoryConfig};
