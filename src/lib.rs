//! BookStack-Backup: scheduled Markdown exports of BookStack wikis
//!
//! This crate walks the shelve/book/chapter/page hierarchy of one or more
//! BookStack instances and writes every page as a Markdown file into a dated
//! directory tree. Each configured instance is re-exported on its own cron
//! schedule.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for backup operations
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Unsupported target type: {0}")]
    UnsupportedTarget(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] api::FetchError),

    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: String,
        source: serde_json::Error,
    },

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to schedule instance '{instance}': {message}")]
    Schedule { instance: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Result type alias for backup operations
pub type Result<T> = std::result::Result<T, BackupError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{BookStackApi, FetchError, HttpFetcher, PageFetcher};
pub use config::{Config, InstanceConfig, Target, TargetConfig};
pub use crawler::{Coordinator, CrawlReport, InstanceScheduler, SchedulerHandle};
