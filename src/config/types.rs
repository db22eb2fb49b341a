use crate::BackupError;
use serde::Deserialize;
use std::path::PathBuf;

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Main configuration structure for BookStack-Backup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

/// One BookStack instance and the backup job bound to it
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    /// Identification key used in log lines
    pub name: String,

    /// Base URL of the BookStack instance (e.g., "https://wiki.example.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// API token id
    #[serde(rename = "token-id")]
    pub token_id: String,

    /// API token secret
    #[serde(rename = "token-secret")]
    pub token_secret: String,

    /// Root directory for all exports of this instance
    #[serde(rename = "backup-path")]
    pub backup_path: PathBuf,

    /// Cron expression (5 or 6/7 fields)
    pub schedule: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// What to export
    pub target: TargetConfig,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

/// Raw target block as written in the configuration file
///
/// Only the list form `ids` is accepted. A single `id` key is rejected at
/// parse time instead of being silently mapped onto `ids`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Either "book" or "shelve"
    #[serde(rename = "type")]
    pub kind: String,

    /// Book or shelve ids, in the order they are crawled
    pub ids: Vec<u64>,
}

/// A target resolved into one of the two recognized kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Book(Vec<u64>),
    Shelve(Vec<u64>),
}

impl TargetConfig {
    /// Resolves the raw `type` string into a [`Target`]
    ///
    /// # Returns
    ///
    /// * `Ok(Target)` - "book" or "shelve"
    /// * `Err(BackupError::UnsupportedTarget)` - any other type
    pub fn resolve(&self) -> crate::Result<Target> {
        match self.kind.as_str() {
            "book" => Ok(Target::Book(self.ids.clone())),
            "shelve" => Ok(Target::Shelve(self.ids.clone())),
            other => Err(BackupError::UnsupportedTarget(other.to_string())),
        }
    }
}

impl Target {
    /// Returns the configured ids regardless of kind
    pub fn ids(&self) -> &[u64] {
        match self {
            Self::Book(ids) | Self::Shelve(ids) => ids,
        }
    }

    /// Returns the configuration keyword for this kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Book(_) => "book",
            Self::Shelve(_) => "shelve",
        }
    }
}
