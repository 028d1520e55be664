//! Nullable challenge resolver — polls whose outcome the test decides.

use std::collections::BTreeMap;
use tcr_challenge::{ChallengeResolver, ResolverError};
use tcr_types::{Address, PollId, Salt, Timestamp};

/// One scripted poll.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPoll {
    pub vote_quorum: u128,
    pub reveal_end: Timestamp,
    /// Ends the poll regardless of the clock.
    pub force_ended: bool,
    pub passed: bool,
    /// Tokens each winning voter revealed.
    pub winners: BTreeMap<Address, u128>,
}

/// A resolver whose polls end when their reveal window elapses (or when forced)
/// and report whatever outcome the test scripted. Unscripted polls fail with no
/// winning voters.
#[derive(Clone, Debug, Default)]
pub struct NullResolver {
    nonce: PollId,
    polls: BTreeMap<PollId, ScriptedPoll>,
}

impl NullResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of `poll_id`.
    pub fn set_outcome(&mut self, poll_id: PollId, passed: bool, winners: &[(&str, u128)]) {
        if let Some(poll) = self.polls.get_mut(&poll_id) {
            poll.passed = passed;
            poll.winners = winners
                .iter()
                .map(|(voter, tokens)| (Address::new(*voter), *tokens))
                .collect();
        }
    }

    /// End `poll_id` immediately.
    pub fn end_poll(&mut self, poll_id: PollId) {
        if let Some(poll) = self.polls.get_mut(&poll_id) {
            poll.force_ended = true;
        }
    }

    pub fn poll(&self, poll_id: PollId) -> Option<&ScriptedPoll> {
        self.polls.get(&poll_id)
    }

    pub fn polls_started(&self) -> usize {
        self.polls.len()
    }

    fn require(&self, poll_id: PollId) -> Result<&ScriptedPoll, ResolverError> {
        self.polls
            .get(&poll_id)
            .ok_or(ResolverError::UnknownPoll(poll_id))
    }

    fn require_ended(&self, poll_id: PollId, now: Timestamp) -> Result<&ScriptedPoll, ResolverError> {
        let poll = self.require(poll_id)?;
        if !(poll.force_ended || poll.reveal_end.has_passed(now)) {
            return Err(ResolverError::PollActive(poll_id));
        }
        Ok(poll)
    }
}

impl ChallengeResolver for NullResolver {
    fn start_poll(
        &mut self,
        vote_quorum: u128,
        commit_duration: u128,
        reveal_duration: u128,
        now: Timestamp,
    ) -> Result<PollId, ResolverError> {
        let reveal_end = commit_duration
            .checked_add(reveal_duration)
            .and_then(|total| now.checked_add_secs(total))
            .ok_or_else(|| ResolverError::InvalidPoll("poll window overflows".into()))?;
        self.nonce += 1;
        self.polls.insert(
            self.nonce,
            ScriptedPoll {
                vote_quorum,
                reveal_end,
                ..ScriptedPoll::default()
            },
        );
        Ok(self.nonce)
    }

    fn poll_ended(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError> {
        let poll = self.require(poll_id)?;
        Ok(poll.force_ended || poll.reveal_end.has_passed(now))
    }

    fn is_passed(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError> {
        Ok(self.require_ended(poll_id, now)?.passed)
    }

    fn total_winning_tokens(&self, poll_id: PollId, now: Timestamp) -> Result<u128, ResolverError> {
        Ok(self.require_ended(poll_id, now)?.winners.values().sum())
    }

    fn num_passing_tokens(
        &self,
        voter: &Address,
        poll_id: PollId,
        _salt: Salt,
        now: Timestamp,
    ) -> Result<u128, ResolverError> {
        self.require_ended(poll_id, now)?
            .winners
            .get(voter)
            .copied()
            .ok_or_else(|| ResolverError::NotEligible {
                voter: voter.clone(),
                poll_id,
                reason: "no winning ballot".into(),
            })
    }
}
