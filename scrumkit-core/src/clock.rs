//! Clock abstraction so timestamps can be injected in tests.

use crate::Timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for created/modified timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;

    /// Calendar day of `now()` in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Clock that advances by a fixed step on every read, giving strictly
/// increasing timestamps.
#[derive(Debug)]
pub struct StepClock {
    next_millis: AtomicI64,
    step_millis: i64,
}

impl StepClock {
    pub fn new(start: Timestamp, step_millis: i64) -> Self {
        Self {
            next_millis: AtomicI64::new(start.timestamp_millis()),
            step_millis,
        }
    }

    /// Starts at 2026-01-01T00:00:00Z and ticks one second per read.
    pub fn starting_2026() -> Self {
        Self {
            next_millis: AtomicI64::new(1_767_225_600_000),
            step_millis: 1_000,
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        let millis = self.next_millis.fetch_add(self.step_millis, Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_clock_is_strictly_increasing() {
        let clock = StepClock::starting_2026();
        let a = clock.now();
        let b = clock.now();
        assert!(b > a);
        assert_eq!((b - a).num_milliseconds(), 1_000);
        assert_eq!(a.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_fixed_clock_today() {
        let at = DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
