//! Ring topology and acquisition-order policies.
//!
//! Actor `i` sits between resource `i` (its left) and resource
//! `(i + 1) mod K` (its right). A policy decides, as a pure function of
//! the actor id, which of the two is taken first.
//!
//! # Why parity breaks the circular wait
//!
//! A circular wait needs every actor to hold its first resource while
//! blocked on its second. Around the ring, each resource would then be
//! the *first* resource of one neighbour and the *second* resource of the
//! other. Call such a resource *mixed*. A full cycle is only possible if
//! all K resources are mixed.
//!
//! Under [`AcquisitionPolicy::LeftFirst`] every resource is mixed, so the
//! classic deadlock is reachable. Under [`AcquisitionPolicy::Parity`] the
//! two neighbours of resource `r > 0` always agree (both take it first
//! when `r` is even, both take it second when `r` is odd), so for even K
//! no resource is mixed and for odd K only resource 0 is.
//! [`mixed_resources`] computes this set.

use ringlock_core::{ActorId, ResourceId};

/// One of an actor's two resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Resource `i` for actor `i`.
    Left,
    /// Resource `(i + 1) mod K` for actor `i`.
    Right,
}

impl Side {
    /// Index into an actor's `[left, right]` resource array.
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// The order in which an actor takes its two resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquisitionOrder {
    /// Left, then right.
    LeftFirst,
    /// Right, then left.
    RightFirst,
}

impl AcquisitionOrder {
    /// The parity rule: even ids go left first, odd ids right first.
    pub const fn parity(actor: ActorId) -> Self {
        if actor.is_even() {
            Self::LeftFirst
        } else {
            Self::RightFirst
        }
    }

    /// `[first, second]`.
    pub const fn sides(self) -> [Side; 2] {
        match self {
            Self::LeftFirst => [Side::Left, Side::Right],
            Self::RightFirst => [Side::Right, Side::Left],
        }
    }

    /// The side taken first.
    pub const fn first(self) -> Side {
        self.sides()[0]
    }

    /// The side taken while already holding the first.
    pub const fn second(self) -> Side {
        self.sides()[1]
    }
}

/// How acquisition orders are assigned across the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AcquisitionPolicy {
    /// Even ids left first, odd ids right first.
    #[default]
    Parity,
    /// Everyone left first. Admits the classic circular wait.
    LeftFirst,
}

impl AcquisitionPolicy {
    /// Acquisition order for `actor`.
    pub const fn order_for(self, actor: ActorId) -> AcquisitionOrder {
        match self {
            Self::Parity => AcquisitionOrder::parity(actor),
            Self::LeftFirst => AcquisitionOrder::LeftFirst,
        }
    }
}

/// Whether a resource is taken first or second by a given actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Taken while holding nothing.
    First,
    /// Taken while holding the other resource.
    Second,
}

/// `[left, right]` resources of `actor` in a ring of `size`.
pub fn ring_neighbours(actor: ActorId, size: usize) -> [ResourceId; 2] {
    let i = actor.index();
    [
        ResourceId(i as u32),
        ResourceId(((i + 1) % size) as u32),
    ]
}

/// The two actors sharing `resource`: `[right-hand user, left-hand user]`,
/// i.e. actors `r - 1` and `r` (mod `size`).
pub fn resource_users(resource: ResourceId, size: usize) -> [ActorId; 2] {
    let r = resource.index();
    [
        ActorId(((r + size - 1) % size) as u32),
        ActorId(r as u32),
    ]
}

/// The role `resource` plays for `actor`, or `None` if it is not one of
/// the actor's neighbours.
pub fn role_of(
    policy: AcquisitionPolicy,
    actor: ActorId,
    resource: ResourceId,
    size: usize,
) -> Option<Role> {
    let neighbours = ring_neighbours(actor, size);
    let side = if neighbours[Side::Left.index()] == resource {
        Side::Left
    } else if neighbours[Side::Right.index()] == resource {
        Side::Right
    } else {
        return None;
    };
    if policy.order_for(actor).first() == side {
        Some(Role::First)
    } else {
        Some(Role::Second)
    }
}

/// Resources that are first for one neighbour and second for the other.
///
/// A circular wait over the whole ring requires every resource to be
/// mixed; see the module documentation.
pub fn mixed_resources(policy: AcquisitionPolicy, size: usize) -> Vec<ResourceId> {
    (0..size as u32)
        .map(ResourceId)
        .filter(|&r| {
            let [a, b] = resource_users(r, size);
            role_of(policy, a, r, size) != role_of(policy, b, r, size)
        })
        .collect()
}
