//! Observation events emitted by actors while the table runs.
//!
//! Events are emitted while the emitting actor still holds the resource
//! in question, so the order in which they arrive on a single channel is
//! consistent with the order in which locks were taken and released.

use std::fmt;

use crate::error::ResourceError;
use crate::id::{ActorId, ResourceId};
use crate::phase::ActorPhase;

/// One observable transition in the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableEvent {
    /// An actor took a resource.
    Acquired {
        /// The resource taken.
        resource: ResourceId,
        /// The new holder.
        owner: ActorId,
    },
    /// An actor is about to give a resource back.
    Released {
        /// The resource being released.
        resource: ResourceId,
        /// The holder releasing it.
        owner: ActorId,
    },
    /// An acquisition was abandoned because the table is shutting down.
    AcquireAborted {
        /// The actor that was waiting.
        actor: ActorId,
        /// Why it gave up.
        error: ResourceError,
    },
    /// An actor moved to a new life-cycle phase.
    PhaseChanged {
        /// The actor.
        actor: ActorId,
        /// Its new phase.
        phase: ActorPhase,
    },
    /// An actor finished a meal.
    MealCompleted {
        /// The actor.
        actor: ActorId,
        /// Meals it still has to eat.
        remaining: u32,
    },
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquired { resource, owner } => write!(f, "R{resource:>2} +A{owner:<2}"),
            Self::Released { resource, owner } => write!(f, "R{resource:>2} -A{owner:<2}"),
            Self::AcquireAborted { actor, error } => write!(f, "A{actor:>2} aborted: {error}"),
            Self::PhaseChanged { actor, phase } => write!(f, "A{actor:>2} {phase}"),
            Self::MealCompleted { actor, remaining } => {
                write!(f, "A{actor:>2} ate, {remaining:>2} left")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_display() {
        let e = TableEvent::Acquired {
            resource: ResourceId(3),
            owner: ActorId(2),
        };
        assert_eq!(e.to_string(), "R 3 +A2 ");
        let e = TableEvent::MealCompleted {
            actor: ActorId(4),
            remaining: 6,
        };
        assert_eq!(e.to_string(), "A 4 ate,  6 left");
    }
}
