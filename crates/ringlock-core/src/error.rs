//! Error types for resource acquisition and release.
//!
//! Two classes of failure exist at the resource level: a protocol
//! violation (a logic bug in the caller, fatal to the run) and
//! unavailability (the table is being torn down, reported but not fatal).

use std::error::Error;
use std::fmt;

use crate::id::{ActorId, ResourceId};

/// The specific protocol rule that was broken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    /// `release` was called by an actor that does not hold the resource.
    NotHolder {
        /// The actual holder at the time of the call, if any.
        holder: Option<ActorId>,
    },
    /// `acquire` was called by the actor that already holds the resource.
    Reacquire,
}

/// Errors from acquiring or releasing a shared resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceError {
    /// The caller broke the acquire/release protocol. The resource state is
    /// left unchanged; the run must be aborted.
    ProtocolViolation {
        /// The resource the call was made on.
        resource: ResourceId,
        /// The actor that made the call.
        caller: ActorId,
        /// Which rule was broken.
        violation: Violation,
    },
    /// The resource was closed by a table teardown while the caller was
    /// waiting for it (or before it asked).
    Unavailable {
        /// The closed resource.
        resource: ResourceId,
    },
}

impl ResourceError {
    /// Whether this error must abort the whole simulation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }

    /// The resource the error refers to.
    pub fn resource(&self) -> ResourceId {
        match self {
            Self::ProtocolViolation { resource, .. } | Self::Unavailable { resource } => *resource,
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation {
                resource,
                caller,
                violation: Violation::NotHolder { holder: Some(h) },
            } => write!(
                f,
                "protocol violation: actor {caller} released resource {resource} held by actor {h}"
            ),
            Self::ProtocolViolation {
                resource,
                caller,
                violation: Violation::NotHolder { holder: None },
            } => write!(
                f,
                "protocol violation: actor {caller} released free resource {resource}"
            ),
            Self::ProtocolViolation {
                resource,
                caller,
                violation: Violation::Reacquire,
            } => write!(
                f,
                "protocol violation: actor {caller} re-acquired resource {resource} it already holds"
            ),
            Self::Unavailable { resource } => {
                write!(f, "resource {resource} is unavailable (table shutting down)")
            }
        }
    }
}

impl Error for ResourceError {}
