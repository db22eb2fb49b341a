//! BookStack-Backup main entry point
//!
//! This is the command-line interface for the scheduled BookStack exporter.

use anyhow::Context;
use bookstack_backup::config::{load_config_with_hash, Config};
use bookstack_backup::crawler::{run_once, Coordinator, InstanceScheduler};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// BookStack-Backup: scheduled Markdown exports of BookStack wikis
///
/// Every configured instance is crawled on its own cron schedule. Pages are
/// written to `<backup-path>/<date>/[shelve_<id>/]book_<id>/Kapitel_<id>/`.
#[derive(Parser, Debug)]
#[command(name = "bookstack-backup")]
#[command(version)]
#[command(about = "Scheduled Markdown backups of BookStack wikis", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl every instance once and exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,

    /// Validate config and show the schedule without crawling
    #[arg(long, conflicts_with = "once")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.once {
        handle_once(config).await
    } else {
        handle_schedule(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bookstack_backup=info,warn"),
            1 => EnvFilter::new("bookstack_backup=debug,info"),
            2 => EnvFilter::new("bookstack_backup=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows instances and their next run
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let scheduler = InstanceScheduler::new(&config.instances)?;

    println!("=== BookStack-Backup Dry Run ===\n");
    for (instance, (_, next)) in config.instances.iter().zip(scheduler.upcoming()) {
        println!("{}:", instance.name);
        println!("  Base URL: {}", instance.base_url);
        println!("  Backup path: {}", instance.backup_path.display());
        println!("  Target: {} {:?}", instance.target.kind, instance.target.ids);
        println!("  Schedule: {}", instance.schedule);
        match next {
            Some(next) => println!("  Next run: {}", next.format("%Y-%m-%d %H:%M:%S %Z")),
            None => println!("  Next run: never"),
        }
        println!();
    }

    println!("✓ Configuration is valid ({} instances)", scheduler.len());
    Ok(())
}

/// Handles the --once mode: crawls every instance immediately
async fn handle_once(config: Config) -> anyhow::Result<()> {
    let coordinators = config
        .instances
        .into_iter()
        .map(|instance| Coordinator::new(Arc::new(instance)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut failed = 0;
    for (name, result) in run_once(coordinators).await {
        match result {
            Ok(report) => tracing::info!("[{}] {}", name, report),
            Err(e) => {
                tracing::error!("[{}] Crawl error: {}", name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} instance(s) failed", failed);
    }
    Ok(())
}

/// Handles the default mode: runs the scheduler until Ctrl-C
async fn handle_schedule(config: Config) -> anyhow::Result<()> {
    let scheduler = InstanceScheduler::new(&config.instances).context("failed to set up scheduler")?;
    tracing::info!("Scheduling {} instance(s)", scheduler.len());

    let mut handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested, waiting for running crawls");

    handle.shutdown().await;
    Ok(())
}
