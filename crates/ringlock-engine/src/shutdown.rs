//! Cooperative table teardown.
//!
//! A [`ShutdownHandle`] can be triggered from any thread. Triggering it
//! does two things:
//!
//! 1. Drops the wake channel's only sender. Every actor sleeps with
//!    `recv_timeout` on a receiver of that channel, so all pauses end at
//!    once with `Disconnected`.
//! 2. Closes every resource, which fails pending and future acquisitions
//!    with [`ResourceError::Unavailable`](ringlock_core::ResourceError::Unavailable).
//!
//! Together these guarantee that no actor stays blocked once teardown has
//! been requested, so `run_to_completion` always returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::resource::Resource;

struct ShutdownInner {
    requested: AtomicBool,
    wake: Mutex<Option<Sender<()>>>,
    resources: Vec<Arc<Resource>>,
}

/// Cloneable trigger for tearing a table down.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

impl ShutdownHandle {
    /// Create a handle covering `resources`, plus the listener actors use.
    pub(crate) fn new(resources: Vec<Arc<Resource>>) -> (Self, ShutdownListener) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let inner = Arc::new(ShutdownInner {
            requested: AtomicBool::new(false),
            wake: Mutex::new(Some(tx)),
            resources,
        });
        let listener = ShutdownListener {
            inner: Arc::clone(&inner),
            wake: rx,
        };
        (Self { inner }, listener)
    }

    /// Request teardown. Idempotent; returns `true` for the call that
    /// actually initiated it.
    pub fn request(&self) -> bool {
        if self.inner.requested.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner
            .wake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        for resource in &self.inner.resources {
            resource.close();
        }
        tracing::info!(resources = self.inner.resources.len(), "table shutdown requested");
        true
    }

    /// Whether teardown has been requested.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("requested", &self.is_requested())
            .finish()
    }
}

/// Actor-side view of the shutdown signal.
#[derive(Clone)]
pub(crate) struct ShutdownListener {
    inner: Arc<ShutdownInner>,
    wake: Receiver<()>,
}

impl ShutdownListener {
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// Pause for `duration` unless teardown is requested first.
    /// Returns `true` if the full pause elapsed.
    pub fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.is_requested();
        }
        match self.wake.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => !self.is_requested(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}
