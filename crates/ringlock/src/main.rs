//! `ringlock` command-line driver.
//!
//! Builds a table from the command line, logs the event stream through
//! `tracing`, runs the table to completion and prints a summary.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ringlock::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pace {
    /// Think 3-6 s, hold 5-10 s, eat 5-10 s.
    Classic,
    /// The classic ranges in milliseconds.
    Brisk,
    /// No pauses at all.
    Instant,
}

impl From<Pace> for TimingConfig {
    fn from(pace: Pace) -> Self {
        match pace {
            Pace::Classic => TimingConfig::classic(),
            Pace::Brisk => TimingConfig::brisk(),
            Pace::Instant => TimingConfig::instant(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Even actors take left first, odd actors right first.
    Parity,
    /// Everyone takes left first. Can deadlock.
    LeftFirst,
}

impl From<Policy> for AcquisitionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Parity => AcquisitionPolicy::Parity,
            Policy::LeftFirst => AcquisitionPolicy::LeftFirst,
        }
    }
}

#[derive(Parser)]
#[command(name = "ringlock")]
#[command(about = "Simulate actors contending for shared resources around a ring")]
struct Cli {
    /// Number of actors (and resources)
    #[arg(short = 'n', long, default_value = "5")]
    actors: usize,

    /// Meals each actor eats before going idle
    #[arg(short, long, default_value = "7")]
    meals: u32,

    /// Pause timings
    #[arg(long, value_enum, default_value = "brisk")]
    pace: Pace,

    /// Acquisition-order policy
    #[arg(long, value_enum, default_value = "parity")]
    policy: Policy,

    /// RNG seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Tear the table down if no meal completes for this many seconds
    #[arg(long)]
    stall_timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn log_events(events: Receiver<TableEvent>) {
    for event in events {
        match event {
            TableEvent::Acquired { resource, owner } => {
                info!(%resource, actor = %owner, "acquired");
            }
            TableEvent::MealCompleted { actor, remaining } => {
                info!(%actor, remaining, "meal completed");
            }
            TableEvent::AcquireAborted { actor, error } => {
                warn!(%actor, "{error}");
            }
            other => debug!("{other}"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let seed = cli.seed.unwrap_or_else(time_seed);
    let config = TableConfig {
        actors: cli.actors,
        meals_per_actor: cli.meals,
        timing: cli.pace.into(),
        policy: cli.policy.into(),
        seed,
        watchdog: WatchdogConfig {
            stall_timeout: cli.stall_timeout_secs.map(Duration::from_secs),
            ..WatchdogConfig::default()
        },
    };
    info!(actors = config.actors, meals = config.meals_per_actor, policy = ?config.policy, seed, "building table");

    let table = Table::build(config).context("invalid table configuration")?;
    let events = table.subscribe();
    let printer = thread::Builder::new()
        .name("ringlock-events".into())
        .spawn(move || log_events(events))
        .context("failed to spawn event logger")?;

    let report = table.run_to_completion().context("table run failed")?;
    if printer.join().is_err() {
        warn!("event logger panicked");
    }

    for actor in &report.actors {
        match &actor.termination {
            Termination::Completed => {
                info!(actor = %actor.actor, meals = actor.meals_eaten, "completed");
            }
            Termination::Cancelled { phase, .. } => {
                warn!(actor = %actor.actor, meals = actor.meals_eaten, %phase, "cancelled");
            }
            Termination::Failed(e) => warn!(actor = %actor.actor, "failed: {e}"),
        }
    }
    if let Some(cycle) = &report.deadlock {
        warn!(?cycle, "run ended in a circular wait");
    }
    if report.stalled {
        warn!("run was stopped by the stall timeout");
    }
    info!(
        total_meals = report.total_meals,
        acquisitions = ?report.resource_acquisitions,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "done"
    );
    Ok(())
}
