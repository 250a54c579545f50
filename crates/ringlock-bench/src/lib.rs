//! Benchmark profiles for the ringlock simulator.
//!
//! - [`reference_config`]: the 5-actor, 7-meal table with no pauses
//! - [`large_ring_config`]: 64 actors for contention scaling

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ringlock_engine::{AcquisitionPolicy, TableConfig, TimingConfig, WatchdogConfig};

/// The reference table: 5 actors, 7 meals each, instant timing.
pub fn reference_config(seed: u64) -> TableConfig {
    TableConfig {
        actors: 5,
        meals_per_actor: 7,
        timing: TimingConfig::instant(),
        policy: AcquisitionPolicy::Parity,
        seed,
        watchdog: WatchdogConfig::default(),
    }
}

/// A 64-actor ring with 100 meals each, instant timing.
pub fn large_ring_config(seed: u64) -> TableConfig {
    TableConfig {
        actors: 64,
        meals_per_actor: 100,
        ..reference_config(seed)
    }
}
