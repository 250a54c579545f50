//! Core types for the ringlock simulation workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the engine, the binary and the test utilities:
//! actor and resource identifiers, the actor life-cycle phases, the
//! resource error taxonomy, and the observation events.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod id;
pub mod phase;

pub use error::{ResourceError, Violation};
pub use event::TableEvent;
pub use id::{ActorId, ResourceId};
pub use phase::ActorPhase;
