//! The actor life cycle: think, take two resources, eat, release.
//!
//! An [`Actor`] is moved onto its own thread by the table and runs
//! [`Actor::run`] until its quota is exhausted or the table is torn down.
//! Its observable state lives in a shared [`ActorStatus`] so the table can
//! sample it while the actor runs.
//!
//! Resources are only ever held through RAII guards, so every exit path
//! (normal release, cancelled pause, failed second acquisition, panic)
//! gives back whatever was taken.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ringlock_core::{ActorId, ActorPhase, ResourceId, TableEvent};
use tracing::{debug, error, info, warn};

use crate::config::{DurationRange, TableConfig, TimingConfig};
use crate::events::EventSink;
use crate::policy::{AcquisitionOrder, Side};
use crate::report::{ActorReport, Termination};
use crate::resource::{Resource, ResourceGuard, OWNER_NONE};
use crate::shutdown::ShutdownListener;

// ── ActorStatus ───────────────────────────────────────────────────

/// Observable state of one actor, shared with the table.
///
/// Written only by the owning actor thread.
pub struct ActorStatus {
    remaining: AtomicU32,
    eaten: AtomicU32,
    eating: AtomicBool,
    phase: AtomicU8,
    waiting_on: AtomicU64,
}

impl ActorStatus {
    fn new(meals: u32) -> Self {
        Self {
            remaining: AtomicU32::new(meals),
            eaten: AtomicU32::new(0),
            eating: AtomicBool::new(false),
            phase: AtomicU8::new(ActorPhase::Thinking as u8),
            waiting_on: AtomicU64::new(OWNER_NONE),
        }
    }

    /// Meals left on the quota. Never increases.
    pub fn remaining_meals(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Meals eaten so far.
    pub fn meals_eaten(&self) -> u32 {
        self.eaten.load(Ordering::Acquire)
    }

    /// Whether the actor is inside its eating pause.
    pub fn is_eating(&self) -> bool {
        self.eating.load(Ordering::Acquire)
    }

    /// Current life-cycle phase.
    pub fn phase(&self) -> ActorPhase {
        ActorPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// The resource the actor is blocked on, if any.
    pub fn waiting_on(&self) -> Option<ResourceId> {
        let raw = self.waiting_on.load(Ordering::Acquire);
        (raw != OWNER_NONE).then(|| ResourceId(raw as u32))
    }

    fn set_waiting(&self, resource: Option<ResourceId>) {
        let raw = resource.map_or(OWNER_NONE, |r| u64::from(r.0));
        self.waiting_on.store(raw, Ordering::Release);
    }

    /// Decrement the quota; returns the meals still left.
    fn consume_meal(&self) -> u32 {
        self.eaten.fetch_add(1, Ordering::AcqRel);
        self.remaining.fetch_sub(1, Ordering::AcqRel) - 1
    }
}

// ── Held ──────────────────────────────────────────────────────────

/// A guard that announces its release on the event stream while the
/// resource is still held.
struct Held<'r> {
    guard: ResourceGuard<'r>,
    events: EventSink,
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        self.events.emit(TableEvent::Released {
            resource: self.guard.resource_id(),
            owner: self.guard.holder(),
        });
        // `guard` is dropped after this body, releasing the resource.
    }
}

// ── Actor ─────────────────────────────────────────────────────────

/// One seat at the table.
pub struct Actor {
    id: ActorId,
    /// `[left, right]`.
    resources: [Arc<Resource>; 2],
    order: AcquisitionOrder,
    timing: TimingConfig,
    rng: ChaCha8Rng,
    status: Arc<ActorStatus>,
    shutdown: ShutdownListener,
    events: EventSink,
}

impl Actor {
    pub(crate) fn new(
        id: ActorId,
        resources: [Arc<Resource>; 2],
        config: &TableConfig,
        shutdown: ShutdownListener,
        events: EventSink,
    ) -> Self {
        Self {
            id,
            resources,
            order: config.policy.order_for(id),
            timing: config.timing,
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ u64::from(id.0)),
            status: Arc::new(ActorStatus::new(config.meals_per_actor)),
            shutdown,
            events,
        }
    }

    /// This actor's id.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Resource on the left (same index as the actor).
    pub fn left(&self) -> &Arc<Resource> {
        &self.resources[Side::Left.index()]
    }

    /// Resource on the right (next index around the ring).
    pub fn right(&self) -> &Arc<Resource> {
        &self.resources[Side::Right.index()]
    }

    /// The order this actor takes its resources in.
    pub fn order(&self) -> AcquisitionOrder {
        self.order
    }

    /// Shared handle to the observable state.
    pub fn status(&self) -> Arc<ActorStatus> {
        Arc::clone(&self.status)
    }

    /// Run the life cycle to its end and report.
    pub fn run(mut self) -> ActorReport {
        let termination = loop {
            if self.status.remaining_meals() == 0 {
                break Termination::Completed;
            }
            if let Err(stop) = self.dine_once() {
                break stop;
            }
        };
        self.set_phase(ActorPhase::Idle);

        ActorReport {
            actor: self.id,
            meals_eaten: self.status.meals_eaten(),
            remaining_meals: self.status.remaining_meals(),
            termination,
        }
    }

    /// One think/acquire/eat/release cycle.
    fn dine_once(&mut self) -> Result<(), Termination> {
        self.set_phase(ActorPhase::Thinking);
        self.pause(self.timing.think, ActorPhase::Thinking)?;

        self.set_phase(ActorPhase::Hungry);
        let first_res = Arc::clone(&self.resources[self.order.first().index()]);
        let second_res = Arc::clone(&self.resources[self.order.second().index()]);
        let first = self.take(&first_res)?;

        self.set_phase(ActorPhase::HoldingFirst);
        self.pause(self.timing.hold, ActorPhase::HoldingFirst)?;
        let second = self.take(&second_res)?;

        self.set_phase(ActorPhase::Eating);
        let remaining = self.status.consume_meal();
        self.status.eating.store(true, Ordering::Release);
        let eaten = self.pause(self.timing.eat, ActorPhase::Eating);
        self.status.eating.store(false, Ordering::Release);

        info!(actor = %self.id, remaining, "meal finished");
        self.events.emit(TableEvent::MealCompleted {
            actor: self.id,
            remaining,
        });

        drop(second);
        drop(first);
        match eaten {
            // The last meal counts even if its pause was cut short.
            Err(_) if remaining == 0 => Ok(()),
            other => other,
        }
    }

    /// Block on `resource`, reporting the outcome.
    fn take<'r>(&self, resource: &'r Resource) -> Result<Held<'r>, Termination> {
        self.status.set_waiting(Some(resource.id()));
        let acquired = resource.acquire(self.id);
        self.status.set_waiting(None);

        match acquired {
            Ok(guard) => {
                debug!(actor = %self.id, resource = %resource.id(), "acquired");
                self.events.emit(TableEvent::Acquired {
                    resource: resource.id(),
                    owner: self.id,
                });
                Ok(Held {
                    guard,
                    events: self.events.clone(),
                })
            }
            Err(e) if e.is_fatal() => {
                error!(actor = %self.id, resource = %resource.id(), "{e}");
                Err(Termination::Failed(e))
            }
            Err(e) => {
                let phase = self.status.phase();
                warn!(actor = %self.id, resource = %resource.id(), %phase, "acquisition abandoned: {e}");
                self.events.emit(TableEvent::AcquireAborted {
                    actor: self.id,
                    error: e,
                });
                Err(Termination::Cancelled {
                    phase,
                    cause: Some(e),
                })
            }
        }
    }

    /// Randomized pause that ends early on teardown.
    fn pause(&mut self, range: DurationRange, phase: ActorPhase) -> Result<(), Termination> {
        let duration = range.sample(&mut self.rng);
        if self.shutdown.pause(duration) {
            Ok(())
        } else {
            warn!(actor = %self.id, %phase, "interrupted by shutdown");
            Err(Termination::Cancelled { phase, cause: None })
        }
    }

    fn set_phase(&self, phase: ActorPhase) {
        self.status.phase.store(phase as u8, Ordering::Release);
        self.events.emit(TableEvent::PhaseChanged {
            actor: self.id,
            phase,
        });
    }
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("remaining_meals", &self.status.remaining_meals())
            .finish()
    }
}
