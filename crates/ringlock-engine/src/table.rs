//! The table: ring wiring, actor threads, and the supervising loop.
//!
//! [`Table::build`] validates a [`TableConfig`] and wires K resources and K
//! actors into a ring. [`Table::run_to_completion`] moves every actor onto
//! a named OS thread, supervises them from the calling thread (the table
//! thread), and joins them all before returning a [`RunReport`].
//!
//! The table thread never touches resource lock state. It waits for actor
//! reports with `recv_timeout` and, on each timeout, hands a
//! [`TableSnapshot`](crate::TableSnapshot) to the watchdog.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use ringlock_core::{ActorId, ResourceError, ResourceId, TableEvent};
use tracing::{error, info, warn};

use crate::actor::Actor;
use crate::config::{ConfigError, TableConfig};
use crate::events::EventSink;
use crate::policy::ring_neighbours;
use crate::report::{ActorReport, RunReport, Termination};
use crate::resource::Resource;
use crate::shutdown::ShutdownHandle;
use crate::watchdog::{TableObserver, Verdict, Watchdog};

// ── RunError ──────────────────────────────────────────────────────

/// Errors that abort [`Table::run_to_completion`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// An actor broke the resource protocol. The table was torn down.
    ProtocolViolation(ResourceError),
    /// An actor thread panicked.
    ActorPanicked {
        /// The actor whose thread panicked.
        actor: ActorId,
    },
    /// The OS refused to create an actor thread. Already spawned actors
    /// were torn down and joined.
    ThreadSpawnFailed {
        /// The OS error, as text.
        reason: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation(e) => write!(f, "run aborted: {e}"),
            Self::ActorPanicked { actor } => write!(f, "actor {actor} panicked"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn actor thread: {reason}")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ProtocolViolation(e) => Some(e),
            _ => None,
        }
    }
}

// ── Table ─────────────────────────────────────────────────────────

/// A ring of K actors and K resources, ready to run.
pub struct Table {
    config: TableConfig,
    resources: Vec<Arc<Resource>>,
    actors: Vec<Actor>,
    shutdown: ShutdownHandle,
    events: EventSink,
}

impl Table {
    /// Validate `config` and wire the ring.
    ///
    /// Nothing is allocated and no thread exists if validation fails.
    pub fn build(config: TableConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let k = config.actors;
        let resources: Vec<Arc<Resource>> = (0..k as u32)
            .map(|r| Arc::new(Resource::new(ResourceId(r))))
            .collect();
        let (shutdown, listener) = ShutdownHandle::new(resources.clone());
        let events = EventSink::default();

        let actors = (0..k as u32)
            .map(ActorId)
            .map(|id| {
                let [left, right] = ring_neighbours(id, k);
                Actor::new(
                    id,
                    [
                        Arc::clone(&resources[left.index()]),
                        Arc::clone(&resources[right.index()]),
                    ],
                    &config,
                    listener.clone(),
                    events.clone(),
                )
            })
            .collect();

        Ok(Self {
            config,
            resources,
            actors,
            shutdown,
            events,
        })
    }

    /// Number of actors (and resources), K.
    pub fn size(&self) -> usize {
        self.actors.len()
    }

    /// Meals each actor must eat, M.
    pub fn meals_per_actor(&self) -> u32 {
        self.config.meals_per_actor
    }

    /// The validated configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The resources, indexed by id.
    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// The actors, indexed by id.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// A trigger that tears the table down from any thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Receive every [`TableEvent`] emitted after this call.
    ///
    /// The stream ends once the run has finished and the table is dropped.
    pub fn subscribe(&self) -> Receiver<TableEvent> {
        self.events.subscribe()
    }

    /// A lock-free sampler of resource and actor state.
    pub fn observer(&self) -> TableObserver {
        TableObserver::new(
            self.resources.clone(),
            self.actors.iter().map(|a| (a.id(), a.status())).collect(),
        )
    }

    /// Run every actor to the end of its life cycle.
    ///
    /// Returns only after every actor thread has been joined. A protocol
    /// violation, a confirmed deadlock or a stall tears the table down;
    /// only the first of these is fatal.
    pub fn run_to_completion(self) -> Result<RunReport, RunError> {
        let observer = self.observer();
        let Self {
            config,
            resources,
            actors,
            shutdown,
            events: _events,
        } = self;
        let k = actors.len();
        let start = Instant::now();
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<ActorReport>();

        let mut handles: Vec<(ActorId, JoinHandle<()>)> = Vec::with_capacity(k);
        for actor in actors {
            let id = actor.id();
            let done = done_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("ringlock-actor-{id}"))
                .spawn(move || {
                    let _ = done.send(actor.run());
                });
            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    error!(actor = %id, "failed to spawn actor thread: {e}");
                    shutdown.request();
                    for (_, handle) in handles {
                        let _ = handle.join();
                    }
                    return Err(RunError::ThreadSpawnFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
        drop(done_tx);
        info!(actors = k, meals = config.meals_per_actor, policy = ?config.policy, "table started");

        let mut watchdog = Watchdog::new(config.watchdog.clone());
        let mut reports: Vec<Option<ActorReport>> = vec![None; k];
        let mut fatal: Option<ResourceError> = None;
        let mut stalled = false;
        let mut deadlock = None;

        loop {
            match done_rx.recv_timeout(config.watchdog.poll_interval) {
                Ok(report) => {
                    if let Termination::Failed(e) = report.termination {
                        if fatal.is_none() {
                            fatal = Some(e);
                            shutdown.request();
                        }
                    }
                    let slot = report.actor.index();
                    reports[slot] = Some(report);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if shutdown.is_requested() {
                        continue;
                    }
                    match watchdog.inspect(&observer.snapshot()) {
                        Verdict::Healthy => {}
                        Verdict::Stalled { idle } => {
                            warn!(idle_ms = idle.as_millis() as u64, "no meal completed; tearing the table down");
                            stalled = true;
                            shutdown.request();
                        }
                        Verdict::Deadlocked(cycle) => {
                            warn!(?cycle, "circular wait confirmed; tearing the table down");
                            deadlock = Some(cycle);
                            shutdown.request();
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let mut panicked = None;
        for (id, handle) in handles {
            if handle.join().is_err() {
                error!(actor = %id, "actor thread panicked");
                panicked.get_or_insert(id);
            }
        }
        let elapsed = start.elapsed();

        if let Some(e) = fatal {
            return Err(RunError::ProtocolViolation(e));
        }
        if let Some(actor) = panicked {
            return Err(RunError::ActorPanicked { actor });
        }

        let actors: Vec<ActorReport> = reports.into_iter().flatten().collect();
        let total_meals = actors.iter().map(|a| u64::from(a.meals_eaten)).sum();
        let report = RunReport {
            actors,
            resource_acquisitions: resources.iter().map(|r| r.acquisition_count()).collect(),
            total_meals,
            elapsed,
            shutdown_requested: shutdown.is_requested(),
            stalled,
            deadlock,
        };
        info!(
            total_meals,
            elapsed_ms = elapsed.as_millis() as u64,
            completed = report.all_completed(),
            "table finished"
        );
        Ok(report)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("actors", &self.actors.len())
            .field("meals_per_actor", &self.config.meals_per_actor)
            .field("policy", &self.config.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::policy::AcquisitionOrder;

    #[test]
    fn build_rejects_before_wiring() {
        assert_eq!(
            Table::build(TableConfig::new(1, 3)).unwrap_err(),
            ConfigError::TooFewActors { configured: 1 }
        );
    }

    #[test]
    fn build_wires_a_ring() {
        let table = Table::build(TableConfig::new(4, 1)).unwrap();
        assert_eq!(table.size(), 4);
        let last = &table.actors()[3];
        assert_eq!(last.left().id(), ResourceId(3));
        assert_eq!(last.right().id(), ResourceId(0));
        assert_eq!(last.order(), AcquisitionOrder::RightFirst);
        assert_eq!(table.actors()[2].order(), AcquisitionOrder::LeftFirst);
    }

    #[test]
    fn five_actors_seven_meals() {
        let table = Table::build(TableConfig::new(5, 7)).unwrap();
        let report = table.run_to_completion().unwrap();

        assert!(report.all_completed());
        assert!(report.actors.iter().all(|a| a.remaining_meals == 0));
        assert!(report.actors.iter().all(|a| a.meals_eaten == 7));
        assert_eq!(report.resource_acquisitions, vec![14; 5]);
        assert_eq!(report.total_meals, 35);
        assert!(!report.shutdown_requested);
        assert_eq!(report.deadlock, None);
    }

    #[test]
    fn two_actors_one_meal() {
        let table = Table::build(TableConfig::new(2, 1)).unwrap();
        let report = table.run_to_completion().unwrap();
        assert!(report.all_completed());
        assert_eq!(report.total_meals, 2);
        assert_eq!(report.resource_acquisitions, vec![2, 2]);
    }

    #[test]
    fn zero_meals_acquires_nothing() {
        let table = Table::build(TableConfig::new(3, 0)).unwrap();
        let observer = table.observer();
        let report = table.run_to_completion().unwrap();
        assert!(report.all_completed());
        assert_eq!(report.resource_acquisitions, vec![0; 3]);
        let snapshot = observer.snapshot();
        assert!(snapshot.actors.iter().all(|a| a.phase.is_terminal()));
        assert!(snapshot.resources.iter().all(|r| !r.is_held()));
    }

    #[test]
    fn shutdown_before_run_cancels_everyone() {
        let config = TableConfig {
            timing: TimingConfig::instant(),
            ..TableConfig::new(3, 5)
        };
        let table = Table::build(config).unwrap();
        table.shutdown_handle().request();
        let report = table.run_to_completion().unwrap();
        assert_eq!(report.cancelled().count(), 3);
        assert_eq!(report.total_meals, 0);
        assert!(report.shutdown_requested);
    }

    #[test]
    fn run_error_exposes_its_source() {
        let err = RunError::ProtocolViolation(ResourceError::Unavailable {
            resource: ResourceId(0),
        });
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("run aborted"));
        assert!(RunError::ActorPanicked { actor: ActorId(2) }.source().is_none());
    }
}
