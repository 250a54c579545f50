//! Table configuration, validation, and error types.
//!
//! [`TableConfig`] is the builder-input for [`Table::build`](crate::Table::build).
//! [`validate()`](TableConfig::validate) checks every structural invariant
//! up front so that a rejected configuration never creates a resource or
//! spawns a thread.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use rand::Rng;

use crate::policy::AcquisitionPolicy;

/// Smallest table that forms a ring of shared resources.
pub const MIN_ACTORS: usize = 2;

/// Upper bound on the table size. Each actor is an OS thread.
pub const MAX_ACTORS: usize = 1024;

// ── DurationRange ─────────────────────────────────────────────────

/// Inclusive range a randomized pause is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DurationRange {
    /// Shortest pause.
    pub min: Duration,
    /// Longest pause.
    pub max: Duration,
}

impl DurationRange {
    /// No pause at all.
    pub const ZERO: Self = Self::fixed(Duration::ZERO);

    /// A range between `min` and `max` inclusive.
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always yields `d`.
    pub const fn fixed(d: Duration) -> Self {
        Self { min: d, max: d }
    }

    /// Shorthand for a millisecond range.
    pub const fn millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    /// Shorthand for a second range.
    pub const fn secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    /// Whether `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Draw a pause uniformly from the range at microsecond resolution.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let lo = self.min.as_micros() as u64;
        let hi = self.max.as_micros() as u64;
        Duration::from_micros(rng.random_range(lo..=hi))
    }
}

// ── TimingConfig ──────────────────────────────────────────────────

/// Randomized pause ranges for each phase of the actor life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Pause while thinking (holding nothing).
    pub think: DurationRange,
    /// Pause after taking the first resource, before asking for the second.
    pub hold: DurationRange,
    /// Pause while eating (holding both).
    pub eat: DurationRange,
}

impl TimingConfig {
    /// Wall-clock timings of the classic demonstration: think 3-6 s,
    /// hold 5-10 s, eat 5-10 s. A 5 x 7 table takes several minutes.
    pub const fn classic() -> Self {
        Self {
            think: DurationRange::secs(3, 6),
            hold: DurationRange::secs(5, 10),
            eat: DurationRange::secs(5, 10),
        }
    }

    /// The classic shape scaled down to milliseconds.
    pub const fn brisk() -> Self {
        Self {
            think: DurationRange::millis(3, 6),
            hold: DurationRange::millis(5, 10),
            eat: DurationRange::millis(5, 10),
        }
    }

    /// No pauses. Maximises contention; used by the trial tests.
    pub const fn instant() -> Self {
        Self {
            think: DurationRange::ZERO,
            hold: DurationRange::ZERO,
            eat: DurationRange::ZERO,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::brisk()
    }
}

// ── WatchdogConfig ────────────────────────────────────────────────

/// Configuration for the table thread's progress watchdog.
///
/// The table thread wakes every `poll_interval` while actors run, samples
/// the table, and looks for a circular wait. A cycle that persists for
/// `deadlock_confirmations` consecutive polls without any meal being
/// completed is treated as a deadlock and the table is torn down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Sampling period. Default: 10 ms.
    pub poll_interval: Duration,
    /// Tear the table down if no meal completes for this long.
    /// Default: `None` (wait forever).
    pub stall_timeout: Option<Duration>,
    /// Consecutive identical cycle sightings required. Default: 3.
    pub deadlock_confirmations: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            stall_timeout: None,
            deadlock_confirmations: 3,
        }
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected during [`TableConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Fewer than [`MIN_ACTORS`] actors requested.
    TooFewActors {
        /// The configured count.
        configured: usize,
    },
    /// More than [`MAX_ACTORS`] actors requested.
    TooManyActors {
        /// The configured count.
        configured: usize,
        /// The limit.
        max: usize,
    },
    /// A pause range has `min > max`.
    InvalidDurationRange {
        /// Which phase the range belongs to.
        phase: &'static str,
        /// The configured range.
        range: DurationRange,
    },
    /// The watchdog poll interval is zero.
    ZeroPollInterval,
    /// `deadlock_confirmations` is zero.
    ZeroDeadlockConfirmations,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewActors { configured } => {
                write!(f, "{configured} actors is below the minimum of {MIN_ACTORS}")
            }
            Self::TooManyActors { configured, max } => {
                write!(f, "{configured} actors exceeds the maximum of {max}")
            }
            Self::InvalidDurationRange { phase, range } => write!(
                f,
                "{phase} range has min {:?} greater than max {:?}",
                range.min, range.max
            ),
            Self::ZeroPollInterval => write!(f, "watchdog poll_interval must be non-zero"),
            Self::ZeroDeadlockConfirmations => {
                write!(f, "watchdog deadlock_confirmations must be at least 1")
            }
        }
    }
}

impl Error for ConfigError {}

// ── TableConfig ───────────────────────────────────────────────────

/// Everything needed to build a [`Table`](crate::Table).
///
/// Meals per actor is a `u32`, so a negative quota is unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Number of actors K (and of resources). Default: 5.
    pub actors: usize,
    /// Meals each actor eats before going idle, M. Default: 7.
    pub meals_per_actor: u32,
    /// Pause ranges. Default: [`TimingConfig::brisk`].
    pub timing: TimingConfig,
    /// Acquisition-order policy. Default: parity.
    pub policy: AcquisitionPolicy,
    /// Base seed; actor `i` draws its pauses from `seed ^ i`. Default: 0.
    pub seed: u64,
    /// Progress watchdog settings.
    pub watchdog: WatchdogConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            actors: 5,
            meals_per_actor: 7,
            timing: TimingConfig::default(),
            policy: AcquisitionPolicy::default(),
            seed: 0,
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl TableConfig {
    /// Default configuration with `actors` seats and `meals_per_actor` meals.
    pub fn new(actors: usize, meals_per_actor: u32) -> Self {
        Self {
            actors,
            meals_per_actor,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actors < MIN_ACTORS {
            return Err(ConfigError::TooFewActors {
                configured: self.actors,
            });
        }
        if self.actors > MAX_ACTORS {
            return Err(ConfigError::TooManyActors {
                configured: self.actors,
                max: MAX_ACTORS,
            });
        }
        for (phase, range) in [
            ("think", self.timing.think),
            ("hold", self.timing.hold),
            ("eat", self.timing.eat),
        ] {
            if !range.is_valid() {
                return Err(ConfigError::InvalidDurationRange { phase, range });
            }
        }
        if self.watchdog.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.watchdog.deadlock_confirmations == 0 {
            return Err(ConfigError::ZeroDeadlockConfirmations);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn default_is_five_by_seven() {
        let config = TableConfig::default();
        assert_eq!(config.actors, 5);
        assert_eq!(config.meals_per_actor, 7);
        assert_eq!(config.policy, AcquisitionPolicy::Parity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_single_actor() {
        assert_eq!(
            TableConfig::new(1, 3).validate(),
            Err(ConfigError::TooFewActors { configured: 1 })
        );
        assert_eq!(
            TableConfig::new(0, 3).validate(),
            Err(ConfigError::TooFewActors { configured: 0 })
        );
    }

    #[test]
    fn rejects_oversized_table() {
        let err = TableConfig::new(MAX_ACTORS + 1, 1).validate().unwrap_err();
        assert!(matches!(err, ConfigError::TooManyActors { .. }));
    }

    #[test]
    fn zero_meals_is_valid() {
        assert!(TableConfig::new(2, 0).validate().is_ok());
    }

    #[test]
    fn rejects_inverted_range() {
        let mut config = TableConfig::default();
        config.timing.hold = DurationRange::millis(9, 2);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDurationRange {
                phase: "hold",
                range: DurationRange::millis(9, 2),
            }
        );
        assert!(err.to_string().starts_with("hold range"));
    }

    #[test]
    fn rejects_degenerate_watchdog() {
        let mut config = TableConfig::default();
        config.watchdog.poll_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let mut config = TableConfig::default();
        config.watchdog.deadlock_confirmations = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDeadlockConfirmations)
        );
    }

    #[test]
    fn fixed_range_always_yields_its_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = DurationRange::fixed(Duration::from_millis(4));
        for _ in 0..10 {
            assert_eq!(range.sample(&mut rng), Duration::from_millis(4));
        }
        assert_eq!(DurationRange::ZERO.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn same_seed_same_pauses() {
        let range = TimingConfig::classic().eat;
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..16 {
            assert_eq!(range.sample(&mut a), range.sample(&mut b));
        }
    }

    proptest! {
        #[test]
        fn samples_stay_in_range(seed in any::<u64>(), lo in 0u64..5_000, span in 0u64..5_000) {
            let range = DurationRange::millis(lo, lo + span);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let d = range.sample(&mut rng);
            prop_assert!(d >= range.min);
            prop_assert!(d <= range.max);
        }

        #[test]
        fn table_size_validation_matches_bounds(actors in 0usize..2_048) {
            let ok = TableConfig::new(actors, 1).validate().is_ok();
            prop_assert_eq!(ok, (MIN_ACTORS..=MAX_ACTORS).contains(&actors));
        }
    }
}
