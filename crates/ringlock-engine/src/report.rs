//! Per-actor and per-run outcome reports.

use std::time::Duration;

use ringlock_core::{ActorId, ActorPhase, ResourceError};

/// How an actor's life cycle ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Ate its full quota. A teardown that cuts the last meal's pause
    /// short still counts as completion.
    Completed,
    /// Stopped by a table teardown with meals still owed. Holds nothing.
    Cancelled {
        /// The phase it was in when the teardown reached it.
        phase: ActorPhase,
        /// Set when the teardown surfaced as a failed acquisition.
        cause: Option<ResourceError>,
    },
    /// Hit a protocol violation. Fatal to the run.
    Failed(ResourceError),
}

/// Final state of one actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActorReport {
    /// Which actor.
    pub actor: ActorId,
    /// Meals eaten during the run.
    pub meals_eaten: u32,
    /// Meals left on its quota.
    pub remaining_meals: u32,
    /// How it stopped.
    pub termination: Termination,
}

impl ActorReport {
    /// Whether the actor ate its whole quota.
    pub fn is_completed(&self) -> bool {
        self.termination == Termination::Completed
    }
}

/// Outcome of [`Table::run_to_completion`](crate::Table::run_to_completion).
#[derive(Clone, Debug)]
pub struct RunReport {
    /// One entry per actor, indexed by id.
    pub actors: Vec<ActorReport>,
    /// Successful acquisitions per resource, indexed by id.
    pub resource_acquisitions: Vec<u64>,
    /// Sum of meals eaten by all actors.
    pub total_meals: u64,
    /// Wall-clock time from the first spawn to the last join.
    pub elapsed: Duration,
    /// Whether a teardown was requested during the run.
    pub shutdown_requested: bool,
    /// Whether the watchdog tore the table down for lack of progress.
    pub stalled: bool,
    /// The circular wait the watchdog confirmed, if any.
    pub deadlock: Option<Vec<ActorId>>,
}

impl RunReport {
    /// Whether every actor ate its full quota.
    pub fn all_completed(&self) -> bool {
        self.actors.iter().all(ActorReport::is_completed)
    }

    /// Actors that were stopped by a teardown.
    pub fn cancelled(&self) -> impl Iterator<Item = &ActorReport> {
        self.actors
            .iter()
            .filter(|a| matches!(a.termination, Termination::Cancelled { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringlock_core::ResourceId;

    fn report(id: u32, termination: Termination) -> ActorReport {
        ActorReport {
            actor: ActorId(id),
            meals_eaten: 0,
            remaining_meals: 0,
            termination,
        }
    }

    #[test]
    fn completion_requires_every_actor() {
        let mut run = RunReport {
            actors: vec![
                report(0, Termination::Completed),
                report(1, Termination::Completed),
            ],
            resource_acquisitions: vec![0, 0],
            total_meals: 0,
            elapsed: Duration::ZERO,
            shutdown_requested: false,
            stalled: false,
            deadlock: None,
        };
        assert!(run.all_completed());
        assert_eq!(run.cancelled().count(), 0);

        run.actors[1].termination = Termination::Cancelled {
            phase: ActorPhase::Hungry,
            cause: Some(ResourceError::Unavailable {
                resource: ResourceId(1),
            }),
        };
        assert!(!run.all_completed());
        assert_eq!(run.cancelled().count(), 1);
    }
}
