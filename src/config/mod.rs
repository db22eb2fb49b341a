//! Configuration module for BookStack-Backup
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bookstack_backup::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! for instance in &config.instances {
//!     println!("{} -> {}", instance.name, instance.backup_path.display());
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, InstanceConfig, Target, TargetConfig, DEFAULT_REQUEST_TIMEOUT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
