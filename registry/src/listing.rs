//! Listings and their derived phase.

use serde::{Deserialize, Serialize};
use tcr_types::{Address, PollId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub application_expiry: Timestamp,
    pub whitelisted: bool,
    pub owner: Address,
    /// Deposit not currently at stake in a challenge.
    pub unstaked_deposit: u128,
    /// Most recent challenge; `None` if never challenged.
    pub challenge_id: Option<PollId>,
    pub exit_time: Option<Timestamp>,
    pub exit_time_expiry: Option<Timestamp>,
}

impl Listing {
    pub fn new(owner: Address, deposit: u128, application_expiry: Timestamp) -> Self {
        Self {
            application_expiry,
            whitelisted: false,
            owner,
            unstaked_deposit: deposit,
            challenge_id: None,
            exit_time: None,
            exit_time_expiry: None,
        }
    }

    pub fn application_ended(&self, now: Timestamp) -> bool {
        self.application_expiry.has_passed(now)
    }

    /// `exit_time <= now <= exit_time_expiry`.
    pub fn exit_window_open(&self, now: Timestamp) -> bool {
        match (self.exit_time, self.exit_time_expiry) {
            (Some(opens), Some(closes)) => opens <= now && now <= closes,
            _ => false,
        }
    }

    /// Whether a new exit may be initiated: never initiated, or the previous window
    /// has closed.
    pub fn can_init_exit(&self, now: Timestamp) -> bool {
        self.exit_time_expiry.map_or(true, |closes| now > closes)
    }
}

/// Where a listing is in its life.
///
/// Removed listings are deleted, so they read back as `Unseen`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingPhase {
    Unseen,
    /// Application period running, no open challenge.
    Applied,
    /// Application period over; `update_status` will whitelist it.
    Whitelistable,
    Whitelisted,
    /// Whitelisted with an exit initiated whose window has not closed.
    Exiting,
    /// Open challenge, poll still running.
    Challenged,
    /// Open challenge whose poll has ended.
    ChallengeResolvable,
}

impl ListingPhase {
    /// Derive the phase from stored state. `challenge_open` and `challenge_ended`
    /// describe the listing's latest challenge.
    pub fn derive(
        listing: Option<&Listing>,
        now: Timestamp,
        challenge_open: bool,
        challenge_ended: bool,
    ) -> Self {
        let Some(listing) = listing else {
            return Self::Unseen;
        };
        if challenge_open {
            return if challenge_ended {
                Self::ChallengeResolvable
            } else {
                Self::Challenged
            };
        }
        if listing.whitelisted {
            let exiting = listing
                .exit_time_expiry
                .is_some_and(|closes| now <= closes);
            return if exiting {
                Self::Exiting
            } else {
                Self::Whitelisted
            };
        }
        if listing.application_ended(now) {
            Self::Whitelistable
        } else {
            Self::Applied
        }
    }
}

/// What `update_status` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusUpdate {
    Whitelisted,
    /// The listing survived its challenge. `whitelisted` is false while its
    /// application period is still running.
    ChallengeFailed { whitelisted: bool },
    /// The challenger won; the listing is gone.
    ChallengeSucceeded,
    /// Already whitelisted and unchallenged.
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing::new(Address::new("owner"), 10, Timestamp::new(100))
    }

    #[test]
    fn phase_follows_application_period() {
        let l = listing();
        assert_eq!(ListingPhase::derive(None, Timestamp::new(0), false, false), ListingPhase::Unseen);
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(99), false, false), ListingPhase::Applied);
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(100), false, false), ListingPhase::Whitelistable);
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(50), true, false), ListingPhase::Challenged);
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(50), true, true), ListingPhase::ChallengeResolvable);
    }

    #[test]
    fn exit_window_is_inclusive() {
        let mut l = listing();
        l.whitelisted = true;
        assert!(l.can_init_exit(Timestamp::new(0)));
        l.exit_time = Some(Timestamp::new(200));
        l.exit_time_expiry = Some(Timestamp::new(300));
        assert!(!l.exit_window_open(Timestamp::new(199)));
        assert!(l.exit_window_open(Timestamp::new(200)));
        assert!(l.exit_window_open(Timestamp::new(300)));
        assert!(!l.exit_window_open(Timestamp::new(301)));
        assert!(!l.can_init_exit(Timestamp::new(300)));
        assert!(l.can_init_exit(Timestamp::new(301)));
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(250), false, false), ListingPhase::Exiting);
        assert_eq!(ListingPhase::derive(Some(&l), Timestamp::new(301), false, false), ListingPhase::Whitelisted);
    }
}
