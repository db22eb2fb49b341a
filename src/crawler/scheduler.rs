//! Scheduler for recurring per-instance crawls
//!
//! This module handles:
//! - Parsing each instance's cron expression up front
//! - One trigger task per instance, sleeping until the next fire time
//! - A per-instance run-lock so overlapping ticks are skipped
//! - Shutdown through a [`SchedulerHandle`]

use crate::config::InstanceConfig;
use crate::crawler::coordinator::{Coordinator, CrawlReport};
use crate::BackupError;
use chrono::{DateTime, Local};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Parses a cron expression
///
/// Five-field expressions (`min hour dom mon dow`) use standard cron
/// numbering for the day of week (0-6, Sunday is 0 or 7) and get a leading
/// `0` seconds field. Six and seven field expressions are used as written,
/// with the `cron` crate's day numbering (1-7, Sunday is 1).
pub fn parse_schedule(expression: &str) -> Result<Schedule, cron::error::Error> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if let [minute, hour, day, month, weekday] = fields.as_slice() {
        let weekday = standard_day_of_week(weekday);
        Schedule::from_str(&format!("0 {} {} {} {} {}", minute, hour, day, month, weekday))
    } else {
        Schedule::from_str(expression.trim())
    }
}

/// Rewrites a standard cron day-of-week field into the `cron` crate's numbering
///
/// Numeric items (values, ranges, steps) are expanded to explicit day lists.
/// Names and anything unparseable are kept so the parser reports them.
fn standard_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|item| match standard_days(item) {
            Some(mut days) => {
                days.sort_unstable();
                days.dedup();
                days.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
            }
            None => item.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Days matched by one standard item, in the `cron` crate's numbering
fn standard_days(item: &str) -> Option<Vec<u32>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<u32>().ok().filter(|s| *s > 0)?)),
        None => (item, None),
    };

    let (first, last) = match range {
        "*" | "?" if step.is_none() => return None,
        "*" | "?" => (0, 6),
        _ => match range.split_once('-') {
            Some((first, last)) => (first.parse().ok()?, last.parse().ok()?),
            None => {
                let first: u32 = range.parse().ok()?;
                (first, if step.is_some() { 6 } else { first })
            }
        },
    };
    if first > last || last > 7 {
        return None;
    }

    let days = (first..=last)
        .step_by(step.unwrap_or(1) as usize)
        .map(|day| if day == 7 { 1 } else { day + 1 })
        .collect();
    Some(days)
}

/// Lifecycle of a started scheduler
///
/// An unstarted scheduler is an [`InstanceScheduler`]; starting it yields a
/// [`SchedulerHandle`] in the `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// One instance bound to its schedule
struct ScheduledInstance {
    coordinator: Arc<Coordinator>,
    schedule: Schedule,
    run_lock: Arc<Mutex<()>>,
}

impl ScheduledInstance {
    fn name(&self) -> &str {
        &self.coordinator.instance().name
    }

    /// Next fire time strictly after `after`
    fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(after).next()
    }

    /// Starts a crawl unless the previous one is still running
    fn try_start_run(&self) -> Option<JoinHandle<()>> {
        let guard = match self.run_lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("[{}] Previous run still active, skipping this trigger", self.name());
                return None;
            }
        };

        let coordinator = Arc::clone(&self.coordinator);
        Some(tokio::spawn(async move {
            let _guard = guard;
            run_instance(&coordinator).await;
        }))
    }
}

/// Registers one recurring crawl per instance
pub struct InstanceScheduler {
    jobs: Vec<ScheduledInstance>,
}

impl InstanceScheduler {
    /// Builds HTTP coordinators for every instance and registers their schedules
    ///
    /// # Returns
    ///
    /// * `Ok(InstanceScheduler)` - Every instance was registered
    /// * `Err(BackupError)` - A schedule was malformed or a client could not be
    ///   built; no instance is registered in that case
    pub fn new(instances: &[InstanceConfig]) -> crate::Result<Self> {
        let coordinators = instances
            .iter()
            .map(|instance| Coordinator::new(Arc::new(instance.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_coordinators(coordinators)
    }

    /// Registers prepared coordinators, each on its instance's schedule
    pub fn from_coordinators(coordinators: Vec<Coordinator>) -> crate::Result<Self> {
        let mut jobs = Vec::with_capacity(coordinators.len());

        for coordinator in coordinators {
            let instance = coordinator.instance();
            let schedule = parse_schedule(&instance.schedule).map_err(|e| BackupError::Schedule {
                instance: instance.name.clone(),
                message: format!("'{}': {}", instance.schedule, e),
            })?;

            jobs.push(ScheduledInstance {
                coordinator: Arc::new(coordinator),
                schedule,
                run_lock: Arc::new(Mutex::new(())),
            });
        }

        Ok(Self { jobs })
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Next fire time of every instance, in registration order
    pub fn upcoming(&self) -> Vec<(String, Option<DateTime<Local>>)> {
        let now = Local::now();
        self.jobs
            .iter()
            .map(|job| (job.name().to_string(), job.next_after(&now)))
            .collect()
    }

    /// Spawns one trigger task per instance
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle stops all triggers as well.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tasks = self
            .jobs
            .into_iter()
            .map(|job| {
                tracing::info!("[{}] Scheduled with '{}'", job.name(), job.coordinator.instance().schedule);
                tokio::spawn(trigger_loop(job, shutdown_rx.clone()))
            })
            .collect();

        SchedulerHandle {
            shutdown_tx,
            tasks,
            state: SchedulerState::Running,
        }
    }
}

/// Owner of the running trigger tasks
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    state: SchedulerState,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Stops all triggers and waits for in-flight crawls to finish
    ///
    /// Calling it again on a stopped handle does nothing.
    pub async fn shutdown(&mut self) -> SchedulerState {
        if self.state == SchedulerState::Stopped {
            return self.state;
        }
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!("Scheduler task failed: {}", e);
            }
        }

        self.state = SchedulerState::Stopped;
        tracing::info!("Scheduler stopped");
        self.state
    }
}

/// Sleeps until each fire time and launches the instance's crawl
async fn trigger_loop(job: ScheduledInstance, mut shutdown: watch::Receiver<bool>) {
    let mut last_fire = Local::now();
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        let now = Local::now();
        let Some(next) = job.next_after(&last_fire.max(now)) else {
            tracing::info!("[{}] Schedule has no upcoming fire time", job.name());
            break;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown.changed() => break,
        }

        last_fire = next;
        if let Some(handle) = job.try_start_run() {
            in_flight = Some(handle);
        }
    }

    if let Some(handle) = in_flight {
        if let Err(e) = handle.await {
            tracing::error!("[{}] Crawl task failed: {}", job.name(), e);
        }
    }
}

/// Runs one crawl and logs its outcome
async fn run_instance(coordinator: &Coordinator) {
    if let Err(e) = coordinator.crawl().await {
        tracing::error!("[{}] Crawl error: {}", coordinator.instance().name, e);
    }
}

/// Crawls every instance once, concurrently, and waits for all of them
pub async fn run_once(
    coordinators: Vec<Coordinator>,
) -> Vec<(String, crate::Result<CrawlReport>)> {
    let handles: Vec<_> = coordinators
        .into_iter()
        .map(|coordinator| {
            let name = coordinator.instance().name.clone();
            (name, tokio::spawn(async move { coordinator.crawl().await }))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        match handle.await {
            Ok(result) => results.push((name, result)),
            Err(e) => tracing::error!("[{}] Crawl task failed: {}", name, e),
        }
    }
    results
}
