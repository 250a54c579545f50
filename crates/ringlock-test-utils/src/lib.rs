//! Test utilities for ringlock development.
//!
//! [`EventLog`] replays a recorded [`TableEvent`] stream against the
//! resource protocol, so integration tests can check mutual exclusion and
//! meal accounting after the fact instead of sampling racy state.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod replay;

use std::thread;
use std::time::{Duration, Instant};

pub use replay::EventLog;

/// Seed used by tests that want reproducible pause sequences.
pub const TEST_SEED: u64 = 0x5EED_0001;

/// Poll `cond` every millisecond until it holds, panicking after `timeout`.
pub fn wait_until(what: &str, timeout: Duration, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out after {timeout:?} waiting for {what}");
        }
        thread::sleep(Duration::from_millis(1));
    }
}
