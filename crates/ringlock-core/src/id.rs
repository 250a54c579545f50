//! Strongly-typed identifiers for actors and resources.

use std::fmt;

/// Identifies an actor (a seat at the table).
///
/// Actors are numbered `0..K` in ring order. The id also selects the
/// acquisition order under the parity policy, so it is stable for the
/// lifetime of a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Returns `true` for even ids.
    pub const fn is_even(self) -> bool {
        self.0 % 2 == 0
    }

    /// Index into per-actor tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for ActorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a shared resource (a fork in the classic formulation).
///
/// Resource `i` sits between actor `i - 1` (for whom it is the right-hand
/// resource) and actor `i` (for whom it is the left-hand resource).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Index into per-resource tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for ResourceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
