//! Actor life-cycle phases.

use std::fmt;

/// Where an actor currently is in its think/acquire/eat cycle.
///
/// ```text
/// Thinking -> Hungry -> HoldingFirst -> Eating -> Thinking
///                                          \----> Idle (terminal)
/// ```
///
/// Any phase may also go straight to `Idle` when the table is torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActorPhase {
    /// Not contending for any resource.
    Thinking = 0,
    /// Blocked on the first resource of its acquisition order.
    Hungry = 1,
    /// Holding the first resource, waiting for (or about to take) the second.
    HoldingFirst = 2,
    /// Holding both resources and consuming a meal.
    Eating = 3,
    /// Terminal: quota exhausted or cancelled.
    Idle = 4,
}

impl ActorPhase {
    /// Decode the `repr(u8)` value stored in an atomic cell.
    ///
    /// Unknown values decode to `Idle`.
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Thinking,
            1 => Self::Hungry,
            2 => Self::HoldingFirst,
            3 => Self::Eating,
            _ => Self::Idle,
        }
    }

    /// Whether this phase is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for ActorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Thinking => "thinking",
            Self::Hungry => "hungry",
            Self::HoldingFirst => "holding-first",
            Self::Eating => "eating",
            Self::Idle => "idle",
        };
        f.pad(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_round_trip_covers_every_phase() {
        for phase in [
            ActorPhase::Thinking,
            ActorPhase::Hungry,
            ActorPhase::HoldingFirst,
            ActorPhase::Eating,
            ActorPhase::Idle,
        ] {
            assert_eq!(ActorPhase::from_u8(phase as u8), phase);
        }
        assert_eq!(ActorPhase::from_u8(200), ActorPhase::Idle);
    }

    #[test]
    fn only_idle_is_terminal() {
        assert!(ActorPhase::Idle.is_terminal());
        assert!(!ActorPhase::Eating.is_terminal());
    }
}
