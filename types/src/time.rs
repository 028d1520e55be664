//! Timestamp type used by every stage deadline.
//!
//! Timestamps are Unix epoch seconds (UTC). Stage lengths are governable `u128`
//! parameters, so every deadline is derived with checked arithmetic: a duration that
//! does not fit the timestamp range is an error, never a wrap-around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the Unix epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Add a governable duration, returning `None` if the result leaves the `u64` range.
    pub fn checked_add_secs(self, secs: u128) -> Option<Timestamp> {
        let secs = u64::try_from(secs).ok()?;
        self.0.checked_add(secs).map(Self)
    }

    /// Whether this deadline has been reached at `now`.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        now.0 >= self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_add_rejects_overflow() {
        let t = Timestamp::new(u64::MAX - 10);
        assert_eq!(t.checked_add_secs(10), Some(Timestamp::new(u64::MAX)));
        assert_eq!(t.checked_add_secs(11), None);
        assert_eq!(Timestamp::EPOCH.checked_add_secs(u128::from(u64::MAX) + 1), None);
    }

    #[test]
    fn deadline_is_inclusive() {
        let deadline = Timestamp::new(100);
        assert!(!deadline.has_passed(Timestamp::new(99)));
        assert!(deadline.has_passed(Timestamp::new(100)));
        assert_eq!(deadline.elapsed_since(Timestamp::new(150)), 50);
    }
}
