//! Exclusively lockable shared resource with FIFO hand-off.
//!
//! The lock state (holder, ticket counters, closed flag) lives behind a
//! `Mutex` and is the only thing acquire/release consult. A separate
//! atomic cell mirrors the holder for observation: it is written while
//! the mutex is held and read lock-free by [`Resource::observe_state`],
//! but never read by the locking protocol itself.
//!
//! Waiters take a ticket on arrival and are served in ticket order, so a
//! release with several blocked waiters hands the resource to exactly one
//! of them (the oldest).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use ringlock_core::{ActorId, ResourceError, ResourceId, Violation};

/// Sentinel stored in the observation cell when nobody holds the resource.
pub const OWNER_NONE: u64 = u64::MAX;

struct LockState {
    holder: Option<ActorId>,
    next_ticket: u64,
    now_serving: u64,
    closed: bool,
}

/// A point-in-time observation of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceState {
    /// The observed resource.
    pub id: ResourceId,
    /// Its holder at the time of observation.
    pub owner: Option<ActorId>,
}

impl ResourceState {
    /// `true` exactly when `owner` is set.
    pub fn is_held(&self) -> bool {
        self.owner.is_some()
    }
}

/// A mutually exclusive resource shared by two neighbouring actors.
pub struct Resource {
    id: ResourceId,
    state: Mutex<LockState>,
    turn: Condvar,
    observed_owner: AtomicU64,
    acquisitions: AtomicU64,
}

// Compile-time assertion: Resource must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Resource>();
};

impl Resource {
    /// Create a free, open resource.
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            state: Mutex::new(LockState {
                holder: None,
                next_ticket: 0,
                now_serving: 0,
                closed: false,
            }),
            turn: Condvar::new(),
            observed_owner: AtomicU64::new(OWNER_NONE),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// This resource's id.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    // No user code runs under the mutex, so a poisoned lock still holds a
    // consistent state.
    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `actor` holds the resource.
    ///
    /// Returns a guard that releases on drop. Fails with
    /// [`ResourceError::Unavailable`] if the resource is closed before or
    /// while waiting, and with a protocol violation if `actor` already
    /// holds it.
    pub fn acquire(&self, actor: ActorId) -> Result<ResourceGuard<'_>, ResourceError> {
        let mut state = self.lock_state();
        if state.holder == Some(actor) {
            return Err(ResourceError::ProtocolViolation {
                resource: self.id,
                caller: actor,
                violation: Violation::Reacquire,
            });
        }
        if state.closed {
            return Err(ResourceError::Unavailable { resource: self.id });
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        while state.holder.is_some() || state.now_serving != ticket {
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
            // An abandoned ticket stalls the queue, which is fine: once
            // closed, nobody is served again.
            if state.closed {
                return Err(ResourceError::Unavailable { resource: self.id });
            }
        }

        state.holder = Some(actor);
        state.now_serving += 1;
        self.observed_owner
            .store(u64::from(actor.0), Ordering::Release);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        drop(state);

        Ok(ResourceGuard {
            resource: self,
            holder: actor,
            armed: true,
        })
    }

    /// Release the resource on behalf of `actor`.
    ///
    /// Only the current holder may release. Any other caller gets a
    /// [`ResourceError::ProtocolViolation`] and the state is left as it was.
    /// Prefer dropping the [`ResourceGuard`].
    pub fn release(&self, actor: ActorId) -> Result<(), ResourceError> {
        let mut state = self.lock_state();
        if state.holder != Some(actor) {
            return Err(ResourceError::ProtocolViolation {
                resource: self.id,
                caller: actor,
                violation: Violation::NotHolder {
                    holder: state.holder,
                },
            });
        }
        state.holder = None;
        self.observed_owner.store(OWNER_NONE, Ordering::Release);
        drop(state);
        // Every waiter re-checks its ticket; only the next in line proceeds.
        self.turn.notify_all();
        Ok(())
    }

    /// Close the resource for teardown.
    ///
    /// Every blocked and future [`acquire`](Self::acquire) fails with
    /// [`ResourceError::Unavailable`]. A current holder may still release.
    pub fn close(&self) {
        let mut state = self.lock_state();
        state.closed = true;
        drop(state);
        self.turn.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Number of actors currently blocked in `acquire`.
    pub fn queued(&self) -> u64 {
        let state = self.lock_state();
        state.next_ticket - state.now_serving
    }

    /// Lock-free observation of the holder. Not a synchronization point.
    pub fn observe_state(&self) -> ResourceState {
        let raw = self.observed_owner.load(Ordering::Acquire);
        ResourceState {
            id: self.id,
            owner: (raw != OWNER_NONE).then(|| ActorId(raw as u32)),
        }
    }

    /// Total successful acquisitions since construction.
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("owner", &self.observe_state().owner)
            .finish()
    }
}

// ── ResourceGuard ─────────────────────────────────────────────────

/// Scoped ownership of a [`Resource`]. Dropping the guard releases it.
#[must_use = "dropping the guard releases the resource immediately"]
pub struct ResourceGuard<'a> {
    resource: &'a Resource,
    holder: ActorId,
    armed: bool,
}

impl ResourceGuard<'_> {
    /// The held resource's id.
    pub fn resource_id(&self) -> ResourceId {
        self.resource.id
    }

    /// The actor holding it.
    pub fn holder(&self) -> ActorId {
        self.holder
    }

    /// Release explicitly, surfacing a protocol error instead of panicking.
    pub fn release(mut self) -> Result<(), ResourceError> {
        self.armed = false;
        self.resource.release(self.holder)
    }
}

impl std::fmt::Debug for ResourceGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("resource", &self.resource.id)
            .field("holder", &self.holder)
            .field("armed", &self.armed)
            .finish()
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Only reachable if someone released through the raw API while the
        // guard was alive.
        if let Err(e) = self.resource.release(self.holder) {
            tracing::error!(resource = %self.resource.id, actor = %self.holder, "{e}");
            if !std::thread::panicking() {
                panic!("{e}");
            }
        }
    }
}
