//! Crawler module for exporting BookStack content
//!
//! This module contains the core crawling logic, including:
//! - Target resolution (books and shelves)
//! - Page grouping, ordering and output paths
//! - Per-instance cron scheduling

mod coordinator;
pub mod layout;
mod scheduler;

pub use coordinator::{Coordinator, CrawlReport};
pub use scheduler::{parse_schedule, run_once, InstanceScheduler, SchedulerHandle, SchedulerState};

use crate::config::InstanceConfig;
use std::sync::Arc;

/// Runs a single crawl of one instance over HTTP
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Target dispatch succeeded
/// * `Err(BackupError)` - The client could not be built or the target type is invalid
pub async fn crawl(instance: InstanceConfig) -> crate::Result<CrawlReport> {
    Coordinator::new(Arc::new(instance))?.crawl().await
}
