//! Reparameterization proposals.

use serde::{Deserialize, Serialize};
use tcr_types::{Address, Param, PollId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalPhase {
    /// Unchallenged, application period running.
    Applied,
    /// Unchallenged, application period over, before `process_by`.
    Settable,
    /// Challenged, poll still running.
    Challenged,
    /// Challenged, poll ended.
    ChallengeResolvable,
    /// Unchallenged and past `process_by`; processing refunds without applying.
    Expired,
}

/// A pending change of one parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamProposal {
    pub app_expiry: Timestamp,
    pub challenge_id: Option<PollId>,
    /// Stake captured at proposal time; a challenger must match it.
    pub deposit: u128,
    pub name: Param,
    pub value: u128,
    pub owner: Address,
    pub process_by: Timestamp,
}

impl ParamProposal {
    pub fn is_challenged(&self) -> bool {
        self.challenge_id.is_some()
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.process_by.has_passed(now)
    }

    /// Unchallenged with `app_expiry <= now < process_by`.
    pub fn can_be_set(&self, now: Timestamp) -> bool {
        !self.is_challenged() && self.app_expiry.has_passed(now) && !self.is_expired(now)
    }

    /// `challenge_resolvable` reports whether the challenge poll has ended.
    pub fn phase(&self, now: Timestamp, challenge_resolvable: bool) -> ProposalPhase {
        match self.challenge_id {
            Some(_) if challenge_resolvable => ProposalPhase::ChallengeResolvable,
            Some(_) => ProposalPhase::Challenged,
            None if self.is_expired(now) => ProposalPhase::Expired,
            None if self.app_expiry.has_passed(now) => ProposalPhase::Settable,
            None => ProposalPhase::Applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> ParamProposal {
        ParamProposal {
            app_expiry: Timestamp::new(100),
            challenge_id: None,
            deposit: 10,
            name: Param::VoteQuorum,
            value: 51,
            owner: Address::new("proposer"),
            process_by: Timestamp::new(200),
        }
    }

    #[test]
    fn settable_window_is_half_open() {
        let p = proposal();
        assert!(!p.can_be_set(Timestamp::new(99)));
        assert!(p.can_be_set(Timestamp::new(100)));
        assert!(p.can_be_set(Timestamp::new(199)));
        assert!(!p.can_be_set(Timestamp::new(200)));
    }

    #[test]
    fn phases() {
        let mut p = proposal();
        assert_eq!(p.phase(Timestamp::new(50), false), ProposalPhase::Applied);
        assert_eq!(p.phase(Timestamp::new(150), false), ProposalPhase::Settable);
        assert_eq!(p.phase(Timestamp::new(250), false), ProposalPhase::Expired);
        p.challenge_id = Some(3);
        assert!(!p.can_be_set(Timestamp::new(150)));
        assert_eq!(p.phase(Timestamp::new(150), false), ProposalPhase::Challenged);
        assert_eq!(p.phase(Timestamp::new(150), true), ProposalPhase::ChallengeResolvable);
    }
}
