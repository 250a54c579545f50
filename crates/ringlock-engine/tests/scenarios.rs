//! End-to-end scenarios checked through the event stream and the observer.

use std::collections::HashMap;
use std::thread;

use ringlock_core::{ActorId, ResourceId};
use ringlock_engine::policy::resource_users;
use ringlock_engine::{Table, TableConfig, TimingConfig};
use ringlock_test_utils::{EventLog, TEST_SEED};

#[test]
fn classic_table_replays_cleanly() {
    let table = Table::build(TableConfig::new(5, 7)).unwrap();
    let rx = table.subscribe();
    let report = table.run_to_completion().unwrap();
    let log = EventLog::collect(rx);

    assert_eq!(log.check_mutual_exclusion(), Ok(()));
    assert_eq!(log.check_meal_countdown(5, 7), Ok(()));
    for r in 0..5 {
        assert_eq!(log.acquisitions_of(ResourceId(r)), 14);
    }
    assert_eq!(report.total_meals, 35);
}

#[test]
fn high_contention_replays_cleanly() {
    let config = TableConfig {
        timing: TimingConfig::instant(),
        seed: TEST_SEED,
        ..TableConfig::new(8, 50)
    };
    let table = Table::build(config).unwrap();
    let rx = table.subscribe();
    table.run_to_completion().unwrap();
    let log = EventLog::collect(rx);

    assert_eq!(log.check_mutual_exclusion(), Ok(()));
    assert_eq!(log.check_meal_countdown(8, 50), Ok(()));
}

#[test]
fn sampled_owners_are_always_neighbours() {
    let config = TableConfig {
        timing: TimingConfig::instant(),
        ..TableConfig::new(6, 200)
    };
    let table = Table::build(config).unwrap();
    let observer = table.observer();
    let runner = thread::spawn(move || table.run_to_completion());

    let mut last_remaining: HashMap<ActorId, u32> = HashMap::new();
    while !runner.is_finished() {
        let snapshot = observer.snapshot();
        for r in &snapshot.resources {
            if let Some(owner) = r.owner {
                assert!(
                    resource_users(r.id, 6).contains(&owner),
                    "resource {} held by non-neighbour {owner}",
                    r.id
                );
            }
        }
        for a in &snapshot.actors {
            let prev = last_remaining.insert(a.id, a.remaining_meals);
            if let Some(prev) = prev {
                assert!(a.remaining_meals <= prev, "actor {} quota went up", a.id);
            }
        }
        thread::yield_now();
    }

    let report = runner.join().unwrap().unwrap();
    assert!(report.all_completed());
    assert_eq!(report.total_meals, 6 * 200);
}
