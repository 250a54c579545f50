//! Table sampling and circular-wait detection.
//!
//! A [`TableObserver`] reads the lock-free observation cells of every
//! resource and actor. The reads are not a single atomic cut, so a
//! [`TableSnapshot`] can show a transient cycle that never existed. The
//! table thread's watchdog therefore only declares a deadlock after the
//! same cycle has been seen on several consecutive polls with no meal
//! completed in between.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ringlock_core::{ActorId, ActorPhase, ResourceId};

use crate::actor::ActorStatus;
use crate::config::WatchdogConfig;
use crate::resource::{Resource, ResourceState};

// ── Snapshots ─────────────────────────────────────────────────────

/// Point-in-time observation of one actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorSnapshot {
    /// The observed actor.
    pub id: ActorId,
    /// Its phase.
    pub phase: ActorPhase,
    /// Meals left on its quota.
    pub remaining_meals: u32,
    /// Meals eaten so far.
    pub meals_eaten: u32,
    /// Whether it was inside its eating pause.
    pub is_eating: bool,
    /// The resource it was blocked on, if any.
    pub waiting_on: Option<ResourceId>,
}

/// Observation of the whole table. Resources and actors are indexed by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSnapshot {
    /// One entry per resource.
    pub resources: Vec<ResourceState>,
    /// One entry per actor.
    pub actors: Vec<ActorSnapshot>,
}

impl TableSnapshot {
    /// Meals eaten across the table.
    pub fn total_meals(&self) -> u64 {
        self.actors.iter().map(|a| u64::from(a.meals_eaten)).sum()
    }

    /// Find a cycle in the wait-for graph.
    ///
    /// Actor `a` waits for actor `b` when `a` is blocked on a resource held
    /// by `b`. Every actor waits on at most one resource, so each node has
    /// at most one outgoing edge and there is at most one cycle reachable
    /// from any start. The returned cycle starts at its smallest id.
    pub fn wait_for_cycle(&self) -> Option<Vec<ActorId>> {
        let owners: HashMap<ResourceId, ActorId> = self
            .resources
            .iter()
            .filter_map(|r| r.owner.map(|o| (r.id, o)))
            .collect();
        let index: HashMap<ActorId, usize> = self
            .actors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
        let next = |i: usize| -> Option<usize> {
            let actor = &self.actors[i];
            let holder = owners.get(&actor.waiting_on?)?;
            if *holder == actor.id {
                return None;
            }
            index.get(holder).copied()
        };

        // 0 = unvisited, 1 = on the current path, 2 = done.
        let mut color = vec![0u8; self.actors.len()];
        for start in 0..self.actors.len() {
            if color[start] != 0 {
                continue;
            }
            let mut path = Vec::new();
            let mut cur = Some(start);
            while let Some(i) = cur {
                match color[i] {
                    0 => {
                        color[i] = 1;
                        path.push(i);
                        cur = next(i);
                    }
                    1 => {
                        let pos = path.iter().position(|&p| p == i)?;
                        let mut cycle: Vec<ActorId> =
                            path[pos..].iter().map(|&p| self.actors[p].id).collect();
                        let min = (0..cycle.len()).min_by_key(|&k| cycle[k])?;
                        cycle.rotate_left(min);
                        return Some(cycle);
                    }
                    _ => break,
                }
            }
            for i in path {
                color[i] = 2;
            }
        }
        None
    }
}

// ── TableObserver ─────────────────────────────────────────────────

/// Samples a running table without touching any lock.
#[derive(Clone)]
pub struct TableObserver {
    resources: Vec<Arc<Resource>>,
    actors: Vec<(ActorId, Arc<ActorStatus>)>,
}

impl TableObserver {
    pub(crate) fn new(
        resources: Vec<Arc<Resource>>,
        actors: Vec<(ActorId, Arc<ActorStatus>)>,
    ) -> Self {
        Self { resources, actors }
    }

    /// Take a snapshot of every resource and actor.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            resources: self.resources.iter().map(|r| r.observe_state()).collect(),
            actors: self
                .actors
                .iter()
                .map(|(id, status)| ActorSnapshot {
                    id: *id,
                    phase: status.phase(),
                    remaining_meals: status.remaining_meals(),
                    meals_eaten: status.meals_eaten(),
                    is_eating: status.is_eating(),
                    waiting_on: status.waiting_on(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for TableObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableObserver")
            .field("resources", &self.resources.len())
            .field("actors", &self.actors.len())
            .finish()
    }
}

// ── Watchdog ──────────────────────────────────────────────────────

/// Outcome of one watchdog inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Healthy,
    /// No meal completed within the stall timeout.
    Stalled { idle: Duration },
    /// The same circular wait was confirmed on consecutive polls.
    Deadlocked(Vec<ActorId>),
}

/// Progress tracker driven by the table thread.
pub(crate) struct Watchdog {
    config: WatchdogConfig,
    last_meals: u64,
    last_progress: Instant,
    suspected: Option<(Vec<ActorId>, u32)>,
}

impl Watchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            last_meals: 0,
            last_progress: Instant::now(),
            suspected: None,
        }
    }

    pub fn inspect(&mut self, snapshot: &TableSnapshot) -> Verdict {
        self.inspect_at(snapshot, Instant::now())
    }

    fn inspect_at(&mut self, snapshot: &TableSnapshot, now: Instant) -> Verdict {
        let meals = snapshot.total_meals();
        if meals != self.last_meals {
            self.last_meals = meals;
            self.last_progress = now;
            self.suspected = None;
            return Verdict::Healthy;
        }

        match snapshot.wait_for_cycle() {
            Some(cycle) => {
                let seen = match self.suspected.take() {
                    Some((prev, n)) if prev == cycle => n + 1,
                    _ => 1,
                };
                if seen >= self.config.deadlock_confirmations {
                    return Verdict::Deadlocked(cycle);
                }
                self.suspected = Some((cycle, seen));
            }
            None => self.suspected = None,
        }

        let idle = now.saturating_duration_since(self.last_progress);
        match self.config.stall_timeout {
            Some(limit) if idle >= limit => Verdict::Stalled { idle },
            _ => Verdict::Healthy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: u32, waiting_on: Option<u32>, meals_eaten: u32) -> ActorSnapshot {
        ActorSnapshot {
            id: ActorId(id),
            phase: if waiting_on.is_some() {
                ActorPhase::HoldingFirst
            } else {
                ActorPhase::Thinking
            },
            remaining_meals: 0,
            meals_eaten,
            is_eating: false,
            waiting_on: waiting_on.map(ResourceId),
        }
    }

    fn resource(id: u32, owner: Option<u32>) -> ResourceState {
        ResourceState {
            id: ResourceId(id),
            owner: owner.map(ActorId),
        }
    }

    /// Everyone holds their left and waits on their right.
    fn full_ring_wait(k: u32) -> TableSnapshot {
        TableSnapshot {
            resources: (0..k).map(|r| resource(r, Some(r))).collect(),
            actors: (0..k).map(|a| actor(a, Some((a + 1) % k), 0)).collect(),
        }
    }

    #[test]
    fn full_ring_wait_is_a_cycle() {
        let cycle = full_ring_wait(5).wait_for_cycle().unwrap();
        assert_eq!(cycle, (0..5).map(ActorId).collect::<Vec<_>>());
    }

    #[test]
    fn chain_without_cycle_is_clean() {
        // Actor 0 waits on actor 1, who waits on a free resource.
        let snapshot = TableSnapshot {
            resources: vec![resource(0, Some(0)), resource(1, Some(1)), resource(2, None)],
            actors: vec![actor(0, Some(1), 0), actor(1, Some(2), 0), actor(2, None, 0)],
        };
        assert_eq!(snapshot.wait_for_cycle(), None);
    }

    #[test]
    fn partial_cycle_is_found_and_rotated() {
        // 3 -> 1 -> 3, actor 0 waits into the cycle from outside.
        let snapshot = TableSnapshot {
            resources: vec![
                resource(0, None),
                resource(1, Some(1)),
                resource(2, Some(3)),
                resource(3, Some(3)),
            ],
            actors: vec![
                actor(0, Some(1), 0),
                actor(1, Some(2), 0),
                actor(2, None, 0),
                actor(3, Some(1), 0),
            ],
        };
        assert_eq!(
            snapshot.wait_for_cycle(),
            Some(vec![ActorId(1), ActorId(3)])
        );
    }

    #[test]
    fn waiting_on_own_resource_is_not_an_edge() {
        let snapshot = TableSnapshot {
            resources: vec![resource(0, Some(0)), resource(1, None)],
            actors: vec![actor(0, Some(0), 0), actor(1, None, 0)],
        };
        assert_eq!(snapshot.wait_for_cycle(), None);
    }

    #[test]
    fn deadlock_needs_consecutive_confirmations() {
        let mut dog = Watchdog::new(WatchdogConfig::default());
        let snapshot = full_ring_wait(3);
        let t0 = Instant::now();
        assert_eq!(dog.inspect_at(&snapshot, t0), Verdict::Healthy);
        assert_eq!(dog.inspect_at(&snapshot, t0), Verdict::Healthy);
        assert!(matches!(
            dog.inspect_at(&snapshot, t0),
            Verdict::Deadlocked(c) if c.len() == 3
        ));
    }

    #[test]
    fn progress_resets_suspicion() {
        let mut dog = Watchdog::new(WatchdogConfig::default());
        let mut snapshot = full_ring_wait(3);
        let t0 = Instant::now();
        dog.inspect_at(&snapshot, t0);
        dog.inspect_at(&snapshot, t0);

        snapshot.actors[0].meals_eaten = 1;
        assert_eq!(dog.inspect_at(&snapshot, t0), Verdict::Healthy);
        assert_eq!(dog.inspect_at(&snapshot, t0), Verdict::Healthy);
        assert_eq!(dog.inspect_at(&snapshot, t0), Verdict::Healthy);
    }

    #[test]
    fn stall_timeout_fires_without_meals() {
        let config = WatchdogConfig {
            stall_timeout: Some(Duration::from_secs(2)),
            ..WatchdogConfig::default()
        };
        let mut dog = Watchdog::new(config);
        let snapshot = TableSnapshot {
            resources: vec![resource(0, None), resource(1, None)],
            actors: vec![actor(0, None, 0), actor(1, None, 0)],
        };
        let t0 = dog.last_progress;
        assert_eq!(
            dog.inspect_at(&snapshot, t0 + Duration::from_secs(1)),
            Verdict::Healthy
        );
        assert_eq!(
            dog.inspect_at(&snapshot, t0 + Duration::from_secs(3)),
            Verdict::Stalled {
                idle: Duration::from_secs(3)
            }
        );
    }
}
