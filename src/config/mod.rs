//! Configuration module for Feed-Tide
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feed_tide::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feed-tide.toml")).unwrap();
//! println!("Batch sync every {}ms", config.sync.fixed_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, SourceEntry, StorageConfig, SyncConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
