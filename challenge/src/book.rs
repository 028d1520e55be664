//! Bookkeeping for every challenge a component has opened.

use crate::challenge::Challenge;
use crate::error::ChallengeError;
use crate::resolver::ChallengeResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_types::{Address, PollId, Salt, SubjectKind, Timestamp};
use tracing::{debug, info};

/// The settled outcome of a challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub challenge_id: PollId,
    pub challenger: Address,
    /// The subject is upheld.
    pub passed: bool,
    pub winner_reward: u128,
    pub reward_pool: u128,
    pub total_tokens: u128,
}

/// Challenges keyed by the id of the poll adjudicating them.
///
/// Resolved challenges are kept so voters can claim afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeBook {
    subject: SubjectKind,
    challenges: BTreeMap<PollId, Challenge>,
}

impl ChallengeBook {
    pub fn new(subject: SubjectKind) -> Self {
        Self {
            subject,
            challenges: BTreeMap::new(),
        }
    }

    pub fn subject(&self) -> SubjectKind {
        self.subject
    }

    /// Record a newly opened challenge under `poll_id`.
    pub fn open(
        &mut self,
        poll_id: PollId,
        challenger: Address,
        stake: u128,
        dispensation_pct: u128,
    ) -> Result<&Challenge, ChallengeError> {
        if self.challenges.contains_key(&poll_id) {
            return Err(ChallengeError::AlreadyExists(poll_id));
        }
        let challenge = Challenge::new(challenger, stake, dispensation_pct)?;
        debug!(subject = ?self.subject, poll_id, stake, reward_pool = challenge.reward_pool, "challenge opened");
        Ok(self.challenges.entry(poll_id).or_insert(challenge))
    }

    pub fn get(&self, challenge_id: PollId) -> Option<&Challenge> {
        self.challenges.get(&challenge_id)
    }

    pub fn contains(&self, challenge_id: PollId) -> bool {
        self.challenges.contains_key(&challenge_id)
    }

    /// The challenge exists and has not been resolved.
    pub fn is_open(&self, challenge_id: PollId) -> bool {
        self.get(challenge_id).is_some_and(|c| !c.resolved)
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    fn require(&self, challenge_id: PollId) -> Result<&Challenge, ChallengeError> {
        self.get(challenge_id)
            .ok_or(ChallengeError::NotFound(challenge_id))
    }

    /// Open and its poll has ended.
    pub fn can_be_resolved(
        &self,
        challenge_id: PollId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<bool, ChallengeError> {
        if !self.is_open(challenge_id) {
            return Ok(false);
        }
        Ok(resolver.poll_ended(challenge_id, now)?)
    }

    /// What the winner of an open, ended challenge would receive.
    pub fn determine_reward(
        &self,
        challenge_id: PollId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<u128, ChallengeError> {
        let challenge = self.require(challenge_id)?;
        if challenge.resolved {
            return Err(ChallengeError::AlreadyResolved(challenge_id));
        }
        if !resolver.poll_ended(challenge_id, now)? {
            return Err(ChallengeError::PollNotEnded(challenge_id));
        }
        let winning = resolver.total_winning_tokens(challenge_id, now)?;
        challenge.winner_reward(winning)
    }

    /// Settle the challenge from its poll outcome.
    ///
    /// Marks it resolved and fixes `total_tokens`. Moving funds is the caller's job.
    pub fn resolve(
        &mut self,
        challenge_id: PollId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<Resolution, ChallengeError> {
        let winner_reward = self.determine_reward(challenge_id, resolver, now)?;
        let passed = resolver.is_passed(challenge_id, now)?;
        let total_tokens = resolver.total_winning_tokens(challenge_id, now)?;

        let subject = self.subject;
        let challenge = self
            .challenges
            .get_mut(&challenge_id)
            .ok_or(ChallengeError::NotFound(challenge_id))?;
        challenge.resolved = true;
        challenge.total_tokens = total_tokens;
        if total_tokens == 0 {
            // The winner took the pool along with both stakes.
            challenge.reward_pool = 0;
        }

        info!(?subject, challenge_id, passed, winner_reward, total_tokens, "challenge resolved");
        Ok(Resolution {
            challenge_id,
            challenger: challenge.challenger.clone(),
            passed,
            winner_reward,
            reward_pool: challenge.reward_pool,
            total_tokens,
        })
    }

    /// A voter's share of a resolved challenge's pool.
    pub fn voter_reward(
        &self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<u128, ChallengeError> {
        let challenge = self.require(challenge_id)?;
        if !challenge.resolved {
            return Err(ChallengeError::NotResolved(challenge_id));
        }
        let tokens = resolver.num_passing_tokens(voter, challenge_id, salt, now)?;
        challenge.voter_reward(tokens)
    }

    /// Record `voter`'s claim and return the amount owed.
    pub fn claim_reward(
        &mut self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<u128, ChallengeError> {
        if self.require(challenge_id)?.has_claimed(voter) {
            return Err(ChallengeError::AlreadyClaimed {
                challenge_id,
                voter: voter.clone(),
            });
        }
        let reward = self.voter_reward(voter, challenge_id, salt, resolver, now)?;

        let challenge = self
            .challenges
            .get_mut(&challenge_id)
            .ok_or(ChallengeError::NotFound(challenge_id))?;
        let remaining = challenge.remaining_pool();
        if reward > remaining {
            return Err(ChallengeError::PoolExhausted {
                challenge_id,
                requested: reward,
                remaining,
            });
        }
        challenge.paid_out += reward;
        challenge.claims.insert(voter.clone());
        debug!(challenge_id, %voter, reward, "voter reward claimed");
        Ok(reward)
    }

    pub fn token_claims(&self, challenge_id: PollId, voter: &Address) -> bool {
        self.get(challenge_id).is_some_and(|c| c.has_claimed(voter))
    }
}
