//! Threaded engine for the ringlock table.
//!
//! K actors sit in a ring with one shared [`Resource`] between each pair of
//! neighbours. Every actor repeatedly thinks, takes both of its resources,
//! eats one meal, and gives the resources back, until it has eaten its
//! quota. Each actor is an OS thread; each resource is an exclusive,
//! FIFO-fair lock with a lock-free observation cell.
//!
//! The order in which an actor takes its two resources is set by an
//! [`AcquisitionPolicy`]. The default, [`AcquisitionPolicy::Parity`], makes
//! a circular wait impossible; see the [`policy`] module.
//!
//! # Usage
//!
//! ```no_run
//! use ringlock_engine::{Table, TableConfig};
//!
//! let table = Table::build(TableConfig::new(5, 7))?;
//! let events = table.subscribe();
//! let report = table.run_to_completion()?;
//! assert_eq!(report.total_meals, 35);
//! for event in events.try_iter() {
//!     println!("{event}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actor;
pub mod config;
pub(crate) mod events;
pub mod policy;
pub mod report;
pub mod resource;
pub mod shutdown;
pub mod table;
pub mod watchdog;

pub use actor::{Actor, ActorStatus};
pub use config::{
    ConfigError, DurationRange, TableConfig, TimingConfig, WatchdogConfig, MAX_ACTORS, MIN_ACTORS,
};
pub use policy::{AcquisitionOrder, AcquisitionPolicy, Side};
pub use report::{ActorReport, RunReport, Termination};
pub use resource::{Resource, ResourceGuard, ResourceState};
pub use shutdown::ShutdownHandle;
pub use table::{RunError, Table};
pub use watchdog::{ActorSnapshot, TableObserver, TableSnapshot};
