//! Nullable clock — deterministic time for testing.

use std::cell::Cell;
use tcr_types::Timestamp;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Operations take `now` explicitly, so tests
/// read it from here and pass it along.
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.set(self.current.get().saturating_add(secs));
    }

    /// Advance by a parameter-sized duration.
    pub fn advance_by(&self, secs: u128) {
        self.advance(u64::try_from(secs).unwrap_or(u64::MAX));
    }

    /// Set the time to a specific value.
    pub fn set(&self, secs: u64) {
        self.current.set(secs);
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_when_told() {
        let clock = NullClock::new(10);
        assert_eq!(clock.now(), Timestamp::new(10));
        clock.advance(5);
        assert_eq!(clock.now(), Timestamp::new(15));
        clock.advance_by(u128::MAX);
        assert_eq!(clock.now().as_secs(), u64::MAX);
        clock.set(3);
        assert_eq!(clock.now().as_secs(), 3);
    }
}
