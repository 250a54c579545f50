//! Offline replay of a recorded event stream.

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use ringlock_core::{ActorId, ResourceId, TableEvent};

/// A recorded sequence of table events, in channel order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<TableEvent>,
}

impl EventLog {
    pub fn new(events: Vec<TableEvent>) -> Self {
        Self { events }
    }

    /// Read until every sender is gone (i.e. the table was dropped).
    pub fn collect(rx: Receiver<TableEvent>) -> Self {
        Self::new(rx.into_iter().collect())
    }

    /// Number of `Acquired` events for `resource`.
    pub fn acquisitions_of(&self, resource: ResourceId) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TableEvent::Acquired { resource: r, .. } if *r == resource))
            .count()
    }

    /// The `remaining` values reported by `actor`'s completed meals.
    pub fn meals_of(&self, actor: ActorId) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TableEvent::MealCompleted { actor: a, remaining } if *a == actor => {
                    Some(*remaining)
                }
                _ => None,
            })
            .collect()
    }

    /// Replay the log against the locking protocol.
    ///
    /// Fails if a resource is acquired while held, released by someone
    /// other than its holder, a meal completes without the eater holding
    /// two resources, or anything is still held at the end of the log.
    pub fn check_mutual_exclusion(&self) -> Result<(), String> {
        let mut holders: HashMap<ResourceId, ActorId> = HashMap::new();
        for (seq, event) in self.events.iter().enumerate() {
            match *event {
                TableEvent::Acquired { resource, owner } => {
                    if let Some(prev) = holders.insert(resource, owner) {
                        return Err(format!(
                            "#{seq}: actor {owner} acquired resource {resource} held by actor {prev}"
                        ));
                    }
                }
                TableEvent::Released { resource, owner } => match holders.remove(&resource) {
                    Some(h) if h == owner => {}
                    other => {
                        return Err(format!(
                            "#{seq}: actor {owner} released resource {resource}, holder was {other:?}"
                        ))
                    }
                },
                TableEvent::MealCompleted { actor, .. } => {
                    let held = holders.values().filter(|&&h| h == actor).count();
                    if held != 2 {
                        return Err(format!(
                            "#{seq}: actor {actor} ate while holding {held} resource(s)"
                        ));
                    }
                }
                TableEvent::AcquireAborted { .. } | TableEvent::PhaseChanged { .. } => {}
            }
        }
        match holders.iter().next() {
            Some((r, a)) => Err(format!("resource {r} still held by actor {a} at end of log")),
            None => Ok(()),
        }
    }

    /// Check that every actor in `actors` counted down `meals - 1, ..., 0`.
    pub fn check_meal_countdown(&self, actors: usize, meals: u32) -> Result<(), String> {
        for a in 0..actors as u32 {
            let got = self.meals_of(ActorId(a));
            let want: Vec<u32> = (0..meals).rev().collect();
            if got != want {
                return Err(format!("actor {a}: meals {got:?}, expected {want:?}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acq(r: u32, a: u32) -> TableEvent {
        TableEvent::Acquired {
            resource: ResourceId(r),
            owner: ActorId(a),
        }
    }

    fn rel(r: u32, a: u32) -> TableEvent {
        TableEvent::Released {
            resource: ResourceId(r),
            owner: ActorId(a),
        }
    }

    fn meal(a: u32, remaining: u32) -> TableEvent {
        TableEvent::MealCompleted {
            actor: ActorId(a),
            remaining,
        }
    }

    #[test]
    fn clean_hand_off_passes() {
        let log = EventLog::new(vec![
            acq(0, 0),
            acq(1, 0),
            meal(0, 0),
            rel(1, 0),
            rel(0, 0),
            acq(1, 1),
            acq(0, 1),
            meal(1, 0),
            rel(0, 1),
            rel(1, 1),
        ]);
        assert_eq!(log.check_mutual_exclusion(), Ok(()));
        assert_eq!(log.check_meal_countdown(2, 1), Ok(()));
        assert_eq!(log.acquisitions_of(ResourceId(0)), 2);
    }

    #[test]
    fn double_acquire_is_caught() {
        let log = EventLog::new(vec![acq(0, 0), acq(0, 1)]);
        let err = log.check_mutual_exclusion().unwrap_err();
        assert!(err.contains("held by actor 0"), "{err}");
    }

    #[test]
    fn meal_with_one_resource_is_caught() {
        let log = EventLog::new(vec![acq(0, 0), meal(0, 0), rel(0, 0)]);
        assert!(log.check_mutual_exclusion().is_err());
    }

    #[test]
    fn leftover_holder_is_caught() {
        let log = EventLog::new(vec![acq(2, 1)]);
        assert!(log.check_mutual_exclusion().unwrap_err().contains("still held"));
    }

    #[test]
    fn short_countdown_is_caught() {
        let log = EventLog::new(vec![meal(0, 1)]);
        assert!(log.check_meal_countdown(1, 2).is_err());
    }
}
