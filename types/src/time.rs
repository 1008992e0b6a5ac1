//! Timestamps and the clock capability.
//!
//! Timestamps are Unix epoch seconds (UTC). Nothing in the engine reads the
//! system clock directly: time enters through a [`Clock`] handed to it at
//! construction, so tests can drive it deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp moved forward by `secs`, saturating at `u64::MAX`.
    pub fn saturating_add(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whole days elapsed since this timestamp (relative to `now`).
    pub fn days_since(&self, now: Timestamp) -> u64 {
        self.elapsed_since(now) / SECONDS_PER_DAY
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of "current time" for the engine.
///
/// Must be monotonically non-decreasing.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp::new(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let start = Timestamp::new(100);
        assert!(!start.has_expired(10, Timestamp::new(109)));
        assert!(start.has_expired(10, Timestamp::new(110)));
    }

    #[test]
    fn days_since_truncates() {
        let start = Timestamp::new(0);
        assert_eq!(start.days_since(Timestamp::new(SECONDS_PER_DAY - 1)), 0);
        assert_eq!(start.days_since(Timestamp::new(3 * SECONDS_PER_DAY + 5)), 3);
        // Clock going backwards never underflows.
        assert_eq!(Timestamp::new(50).days_since(Timestamp::new(10)), 0);
    }

    #[test]
    fn saturating_add_caps() {
        assert_eq!(Timestamp::new(u64::MAX - 1).saturating_add(10).as_secs(), u64::MAX);
    }
}
