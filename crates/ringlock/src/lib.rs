//! Ringlock: a dining-table resource contention simulator.
//!
//! K actors share K resources arranged in a ring; each actor needs both of
//! its neighbouring resources to make progress. The default acquisition
//! policy orders the two acquisitions by actor parity, which rules out a
//! circular wait. This facade re-exports the sub-crates and provides a
//! [`prelude`].
//!
//! # Quick start
//!
//! ```rust
//! use ringlock::prelude::*;
//!
//! let config = TableConfig {
//!     timing: TimingConfig::instant(),
//!     ..TableConfig::new(5, 3)
//! };
//! let report = Table::build(config).unwrap().run_to_completion().unwrap();
//! assert!(report.all_completed());
//! assert_eq!(report.total_meals, 15);
//! ```
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ringlock-core` | ids, phases, errors, events |
//! | [`engine`] | `ringlock-engine` | resources, policies, actors, table, watchdog |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, actor phases, resource errors and table events
/// (`ringlock-core`).
pub use ringlock_core as types;

/// The threaded table engine (`ringlock-engine`).
///
/// [`engine::Table`] wires and runs the ring; [`engine::policy`] holds the
/// acquisition-order rules.
pub use ringlock_engine as engine;

/// Common imports for typical ringlock usage.
pub mod prelude {
    // Core types
    pub use ringlock_core::{ActorId, ActorPhase, ResourceError, ResourceId, TableEvent};

    // Configuration
    pub use ringlock_engine::{
        AcquisitionPolicy, ConfigError, DurationRange, TableConfig, TimingConfig, WatchdogConfig,
    };

    // Running and reporting
    pub use ringlock_engine::{
        ActorReport, RunError, RunReport, ShutdownHandle, Table, TableObserver, TableSnapshot,
        Termination,
    };
}
