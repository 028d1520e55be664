//! Polls and ballots.

use crate::quorum::QuorumRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_types::{Address, SecretHash, Timestamp, VoteOption};

/// Where a poll is in its life, derived from its windows and `now`.
///
/// A poll opens for commits the moment it is created, so there is no separate
/// pre-commit phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollPhase {
    CommitOpen,
    RevealOpen,
    Ended,
}

/// One voter's commitment in one poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub commit_hash: SecretHash,
    pub num_tokens: u128,
    pub revealed: Option<VoteOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub commit_end: Timestamp,
    pub reveal_end: Timestamp,
    /// Percentage of revealed tokens that must side `For`.
    pub vote_quorum: u128,
    pub votes_for: u128,
    pub votes_against: u128,
    pub ballots: BTreeMap<Address, Ballot>,
}

impl Poll {
    pub fn new(vote_quorum: u128, commit_end: Timestamp, reveal_end: Timestamp) -> Self {
        Self {
            commit_end,
            reveal_end,
            vote_quorum,
            votes_for: 0,
            votes_against: 0,
            ballots: BTreeMap::new(),
        }
    }

    pub fn phase(&self, now: Timestamp) -> PollPhase {
        if now < self.commit_end {
            PollPhase::CommitOpen
        } else if now < self.reveal_end {
            PollPhase::RevealOpen
        } else {
            PollPhase::Ended
        }
    }

    pub fn commit_period_active(&self, now: Timestamp) -> bool {
        self.phase(now) == PollPhase::CommitOpen
    }

    pub fn reveal_period_active(&self, now: Timestamp) -> bool {
        self.phase(now) == PollPhase::RevealOpen
    }

    pub fn ended(&self, now: Timestamp) -> bool {
        self.phase(now) == PollPhase::Ended
    }

    pub fn passes(&self, rule: QuorumRule) -> bool {
        rule.passes(self.vote_quorum, self.votes_for, self.votes_against)
    }

    pub fn winning_option(&self, rule: QuorumRule) -> VoteOption {
        VoteOption::from(self.passes(rule))
    }

    pub fn winning_tokens(&self, rule: QuorumRule) -> u128 {
        match self.winning_option(rule) {
            VoteOption::For => self.votes_for,
            VoteOption::Against => self.votes_against,
        }
    }

    pub fn ballot(&self, voter: &Address) -> Option<&Ballot> {
        self.ballots.get(voter)
    }
}
