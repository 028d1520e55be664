//! The PLCR voting engine.

use crate::error::VotingError;
use crate::locks::LockIndex;
use crate::poll::{Ballot, Poll, PollPhase};
use crate::quorum::QuorumRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_challenge::{ChallengeResolver, ResolverError};
use tcr_crypto::vote_commitment;
use tcr_ledger::{StagedLedger, TokenLedger};
use tcr_types::{Address, PollId, Salt, SecretHash, TcrEvent, Timestamp, VoteOption};
use tracing::{debug, info};

/// One entry of a batched commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub poll_id: PollId,
    pub secret_hash: SecretHash,
    pub num_tokens: u128,
    pub prev_poll: Option<PollId>,
}

/// One entry of a batched reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRequest {
    pub poll_id: PollId,
    pub option: VoteOption,
    pub salt: Salt,
}

/// Token-weighted commit-reveal polls.
///
/// Voting rights are tokens held in `escrow` on the voter's behalf. Every ledger
/// movement goes through the `TokenLedger` the caller passes in, so the engine
/// itself holds no balances other than its accounting of who escrowed what.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlcrVoting {
    escrow: Address,
    quorum_rule: QuorumRule,
    poll_nonce: PollId,
    polls: BTreeMap<PollId, Poll>,
    vote_token_balance: BTreeMap<Address, u128>,
    locks: BTreeMap<Address, LockIndex>,
    #[serde(skip)]
    pending_events: Vec<TcrEvent>,
}

impl PlcrVoting {
    pub fn new(escrow: Address, quorum_rule: QuorumRule) -> Self {
        Self {
            escrow,
            quorum_rule,
            poll_nonce: 0,
            polls: BTreeMap::new(),
            vote_token_balance: BTreeMap::new(),
            locks: BTreeMap::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn escrow(&self) -> &Address {
        &self.escrow
    }

    pub fn quorum_rule(&self) -> QuorumRule {
        self.quorum_rule
    }

    /// Take the events buffered since the last drain.
    pub fn drain_events(&mut self) -> Vec<TcrEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ── Polls ─────────────────────────────────────────────────────────────

    /// Open a poll whose commit window starts now. Ids start at 1.
    pub fn start_poll(
        &mut self,
        vote_quorum: u128,
        commit_duration: u128,
        reveal_duration: u128,
        now: Timestamp,
    ) -> Result<PollId, VotingError> {
        if vote_quorum > 100 {
            return Err(VotingError::InvalidQuorum(vote_quorum));
        }
        let commit_end = now
            .checked_add_secs(commit_duration)
            .ok_or(VotingError::Overflow)?;
        let reveal_end = commit_end
            .checked_add_secs(reveal_duration)
            .ok_or(VotingError::Overflow)?;
        let poll_id = self.poll_nonce.checked_add(1).ok_or(VotingError::Overflow)?;

        self.poll_nonce = poll_id;
        self.polls
            .insert(poll_id, Poll::new(vote_quorum, commit_end, reveal_end));
        info!(poll_id, vote_quorum, %commit_end, %reveal_end, "poll created");
        self.pending_events.push(TcrEvent::PollCreated {
            poll_id,
            vote_quorum,
            commit_end,
            reveal_end,
        });
        Ok(poll_id)
    }

    pub fn poll(&self, poll_id: PollId) -> Option<&Poll> {
        self.polls.get(&poll_id)
    }

    fn require_poll(&self, poll_id: PollId) -> Result<&Poll, VotingError> {
        self.polls
            .get(&poll_id)
            .ok_or(VotingError::PollNotFound(poll_id))
    }

    fn require_ended(&self, poll_id: PollId, now: Timestamp) -> Result<&Poll, VotingError> {
        let poll = self.require_poll(poll_id)?;
        if !poll.ended(now) {
            return Err(VotingError::PollNotEnded(poll_id));
        }
        Ok(poll)
    }

    pub fn poll_exists(&self, poll_id: PollId) -> bool {
        self.polls.contains_key(&poll_id)
    }

    pub fn poll_phase(&self, poll_id: PollId, now: Timestamp) -> Result<PollPhase, VotingError> {
        Ok(self.require_poll(poll_id)?.phase(now))
    }

    pub fn poll_ended(&self, poll_id: PollId, now: Timestamp) -> Result<bool, VotingError> {
        Ok(self.require_poll(poll_id)?.ended(now))
    }

    pub fn commit_period_active(&self, poll_id: PollId, now: Timestamp) -> Result<bool, VotingError> {
        Ok(self.require_poll(poll_id)?.commit_period_active(now))
    }

    pub fn reveal_period_active(&self, poll_id: PollId, now: Timestamp) -> Result<bool, VotingError> {
        Ok(self.require_poll(poll_id)?.reveal_period_active(now))
    }

    /// Whether the subject of an ended poll is upheld.
    pub fn is_passed(&self, poll_id: PollId, now: Timestamp) -> Result<bool, VotingError> {
        Ok(self.require_ended(poll_id, now)?.passes(self.quorum_rule))
    }

    pub fn get_total_number_of_tokens_for_winning_option(
        &self,
        poll_id: PollId,
        now: Timestamp,
    ) -> Result<u128, VotingError> {
        Ok(self
            .require_ended(poll_id, now)?
            .winning_tokens(self.quorum_rule))
    }

    /// Tokens `voter` revealed for the winning side, provided `salt` opens their
    /// commitment to that side.
    pub fn get_num_passing_tokens(
        &self,
        voter: &Address,
        poll_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, VotingError> {
        let poll = self.require_ended(poll_id, now)?;
        let ballot = poll.ballot(voter).ok_or_else(|| VotingError::NotCommitted {
            voter: voter.clone(),
            poll_id,
        })?;
        let revealed = ballot.revealed.ok_or_else(|| VotingError::NotRevealed {
            voter: voter.clone(),
            poll_id,
        })?;
        let winning = poll.winning_option(self.quorum_rule);
        if revealed != winning {
            return Err(VotingError::LosingSide {
                voter: voter.clone(),
                poll_id,
            });
        }
        if vote_commitment(winning, salt) != ballot.commit_hash {
            return Err(VotingError::HashMismatch {
                voter: voter.clone(),
                poll_id,
            });
        }
        Ok(ballot.num_tokens)
    }

    // ── Voting rights ─────────────────────────────────────────────────────

    pub fn vote_token_balance(&self, voter: &Address) -> u128 {
        self.vote_token_balance.get(voter).copied().unwrap_or(0)
    }

    /// Escrow `num_tokens` from `voter` as voting rights.
    pub fn request_voting_rights(
        &mut self,
        ledger: &mut dyn TokenLedger,
        voter: &Address,
        num_tokens: u128,
    ) -> Result<(), VotingError> {
        if num_tokens == 0 {
            return Err(VotingError::ZeroTokens);
        }
        let updated = self
            .vote_token_balance(voter)
            .checked_add(num_tokens)
            .ok_or(VotingError::Overflow)?;
        ledger.transfer_from(&self.escrow, voter, &self.escrow, num_tokens)?;
        self.vote_token_balance.insert(voter.clone(), updated);
        debug!(%voter, num_tokens, balance = updated, "voting rights granted");
        self.pending_events.push(TcrEvent::VotingRightsGranted {
            num_tokens,
            voter: voter.clone(),
        });
        Ok(())
    }

    /// Return unlocked voting rights to `voter`.
    pub fn withdraw_voting_rights(
        &mut self,
        ledger: &mut dyn TokenLedger,
        voter: &Address,
        num_tokens: u128,
    ) -> Result<(), VotingError> {
        if num_tokens == 0 {
            return Err(VotingError::ZeroTokens);
        }
        let balance = self.vote_token_balance(voter);
        let available = balance.saturating_sub(self.get_locked_tokens(voter));
        if num_tokens > available {
            return Err(VotingError::InsufficientVotingRights {
                voter: voter.clone(),
                requested: num_tokens,
                available,
            });
        }
        ledger.transfer(&self.escrow, voter, num_tokens)?;
        self.vote_token_balance
            .insert(voter.clone(), balance - num_tokens);
        debug!(%voter, num_tokens, "voting rights withdrawn");
        self.pending_events.push(TcrEvent::VotingRightsWithdrawn {
            num_tokens,
            voter: voter.clone(),
        });
        Ok(())
    }

    // ── Commit ────────────────────────────────────────────────────────────

    /// Commit a blinded ballot of `num_tokens` to `poll_id`.
    ///
    /// Missing voting rights are requested from the voter's balance first. `prev_poll`
    /// must name the poll this commitment follows in the voter's lock order (see
    /// [`PlcrVoting::get_insert_point_for_num_tokens`]).
    #[allow(clippy::too_many_arguments)]
    pub fn commit_vote(
        &mut self,
        ledger: &mut dyn TokenLedger,
        voter: &Address,
        poll_id: PollId,
        secret_hash: SecretHash,
        num_tokens: u128,
        prev_poll: Option<PollId>,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let poll = self.require_poll(poll_id)?;
        if !poll.commit_period_active(now) {
            return Err(VotingError::CommitPeriodInactive(poll_id));
        }
        if poll.ballots.contains_key(voter) {
            return Err(VotingError::AlreadyCommitted {
                voter: voter.clone(),
                poll_id,
            });
        }
        if secret_hash.is_zero() {
            return Err(VotingError::ZeroSecretHash);
        }
        if num_tokens == 0 {
            return Err(VotingError::ZeroTokens);
        }
        if !self.valid_position(voter, prev_poll, poll_id, num_tokens) {
            return Err(VotingError::InvalidInsertPosition {
                poll_id,
                prev: prev_poll,
                tokens: num_tokens,
            });
        }

        let balance = self.vote_token_balance(voter);
        if balance < num_tokens {
            self.request_voting_rights(ledger, voter, num_tokens - balance)?;
        }

        let locks = self.locks.entry(voter.clone()).or_default();
        if !locks.insert(poll_id, num_tokens, prev_poll) {
            return Err(VotingError::InvalidInsertPosition {
                poll_id,
                prev: prev_poll,
                tokens: num_tokens,
            });
        }
        let poll = self
            .polls
            .get_mut(&poll_id)
            .ok_or(VotingError::PollNotFound(poll_id))?;
        poll.ballots.insert(
            voter.clone(),
            Ballot {
                commit_hash: secret_hash,
                num_tokens,
                revealed: None,
            },
        );
        debug!(%voter, poll_id, num_tokens, "vote committed");
        self.pending_events.push(TcrEvent::VoteCommitted {
            poll_id,
            num_tokens,
            voter: voter.clone(),
        });
        Ok(())
    }

    /// Commit several ballots; either all are recorded or none.
    pub fn commit_votes(
        &mut self,
        ledger: &mut dyn TokenLedger,
        voter: &Address,
        batch: &[CommitRequest],
        now: Timestamp,
    ) -> Result<(), VotingError> {
        self.atomically(ledger, |engine, staged| {
            for req in batch {
                engine.commit_vote(
                    staged,
                    voter,
                    req.poll_id,
                    req.secret_hash,
                    req.num_tokens,
                    req.prev_poll,
                    now,
                )?;
            }
            Ok(())
        })
    }

    // ── Reveal ────────────────────────────────────────────────────────────

    /// Open a commitment and count its tokens.
    pub fn reveal_vote(
        &mut self,
        voter: &Address,
        poll_id: PollId,
        option: VoteOption,
        salt: Salt,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let poll = self
            .polls
            .get_mut(&poll_id)
            .ok_or(VotingError::PollNotFound(poll_id))?;
        if !poll.reveal_period_active(now) {
            return Err(VotingError::RevealPeriodInactive(poll_id));
        }
        let ballot = poll.ballots.get(voter).ok_or_else(|| VotingError::NotCommitted {
            voter: voter.clone(),
            poll_id,
        })?;
        if ballot.revealed.is_some() {
            return Err(VotingError::AlreadyRevealed {
                voter: voter.clone(),
                poll_id,
            });
        }
        if vote_commitment(option, salt) != ballot.commit_hash {
            return Err(VotingError::HashMismatch {
                voter: voter.clone(),
                poll_id,
            });
        }
        let num_tokens = ballot.num_tokens;
        let tally = match option {
            VoteOption::For => &mut poll.votes_for,
            VoteOption::Against => &mut poll.votes_against,
        };
        *tally = tally.checked_add(num_tokens).ok_or(VotingError::Overflow)?;
        if let Some(ballot) = poll.ballots.get_mut(voter) {
            ballot.revealed = Some(option);
        }
        let (votes_for, votes_against) = (poll.votes_for, poll.votes_against);

        if let Some(locks) = self.locks.get_mut(voter) {
            locks.remove(poll_id);
        }
        debug!(%voter, poll_id, ?option, num_tokens, "vote revealed");
        self.pending_events.push(TcrEvent::VoteRevealed {
            poll_id,
            num_tokens,
            votes_for,
            votes_against,
            choice: option,
            voter: voter.clone(),
        });
        Ok(())
    }

    /// Reveal several ballots; either all are counted or none.
    pub fn reveal_votes(
        &mut self,
        voter: &Address,
        batch: &[RevealRequest],
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let mut scratch = self.clone();
        for req in batch {
            scratch.reveal_vote(voter, req.poll_id, req.option, req.salt, now)?;
        }
        *self = scratch;
        Ok(())
    }

    // ── Rescue ────────────────────────────────────────────────────────────

    /// Release the lock of a commitment that was never revealed.
    pub fn rescue_tokens(
        &mut self,
        voter: &Address,
        poll_id: PollId,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let poll = self.require_ended(poll_id, now)?;
        let unrevealed = poll
            .ballot(voter)
            .is_some_and(|ballot| ballot.revealed.is_none());
        let released = match self.locks.get_mut(voter) {
            Some(locks) if unrevealed => locks.remove(poll_id),
            _ => None,
        };
        if released.is_none() {
            return Err(VotingError::NothingToRescue {
                voter: voter.clone(),
                poll_id,
            });
        }
        debug!(%voter, poll_id, "tokens rescued");
        self.pending_events.push(TcrEvent::TokensRescued {
            poll_id,
            voter: voter.clone(),
        });
        Ok(())
    }

    pub fn rescue_tokens_in_multiple_polls(
        &mut self,
        voter: &Address,
        poll_ids: &[PollId],
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let mut scratch = self.clone();
        for poll_id in poll_ids {
            scratch.rescue_tokens(voter, *poll_id, now)?;
        }
        *self = scratch;
        Ok(())
    }

    // ── Ballot and lock views ─────────────────────────────────────────────

    pub fn did_commit(&self, voter: &Address, poll_id: PollId) -> Result<bool, VotingError> {
        Ok(self.require_poll(poll_id)?.ballot(voter).is_some())
    }

    pub fn did_reveal(&self, voter: &Address, poll_id: PollId) -> Result<bool, VotingError> {
        Ok(self
            .require_poll(poll_id)?
            .ballot(voter)
            .is_some_and(|b| b.revealed.is_some()))
    }

    pub fn get_commit_hash(&self, voter: &Address, poll_id: PollId) -> Option<SecretHash> {
        self.poll(poll_id)?.ballot(voter).map(|b| b.commit_hash)
    }

    /// Tokens committed by `voter` to `poll_id`; zero without a commitment.
    pub fn get_num_tokens(&self, voter: &Address, poll_id: PollId) -> u128 {
        self.poll(poll_id)
            .and_then(|p| p.ballot(voter))
            .map_or(0, |b| b.num_tokens)
    }

    pub fn get_last_node(&self, voter: &Address) -> Option<PollId> {
        self.locks.get(voter).and_then(LockIndex::last_node)
    }

    /// Largest amount locked in any of the voter's open commitments.
    pub fn get_locked_tokens(&self, voter: &Address) -> u128 {
        self.locks.get(voter).map_or(0, LockIndex::locked_tokens)
    }

    pub fn get_insert_point_for_num_tokens(
        &self,
        voter: &Address,
        num_tokens: u128,
        poll_id: PollId,
    ) -> Option<PollId> {
        self.locks
            .get(voter)
            .and_then(|locks| locks.insert_point(num_tokens, poll_id))
    }

    pub fn valid_position(
        &self,
        voter: &Address,
        prev_poll: Option<PollId>,
        poll_id: PollId,
        num_tokens: u128,
    ) -> bool {
        match self.locks.get(voter) {
            Some(locks) => locks.valid_position(prev_poll, poll_id, num_tokens),
            None => prev_poll.is_none(),
        }
    }

    pub fn lock_index(&self, voter: &Address) -> Option<&LockIndex> {
        self.locks.get(voter)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Run `op` against a scratch copy and a staged ledger, keeping both only if it
    /// succeeds and the ledger accepts the staged transfers.
    fn atomically<T>(
        &mut self,
        ledger: &mut dyn TokenLedger,
        op: impl FnOnce(&mut Self, &mut dyn TokenLedger) -> Result<T, VotingError>,
    ) -> Result<T, VotingError> {
        let mut scratch = self.clone();
        let (out, journal) = {
            let mut staged = StagedLedger::new(&*ledger);
            let out = op(&mut scratch, &mut staged)?;
            (out, staged.into_journal())
        };
        journal.apply(ledger)?;
        *self = scratch;
        Ok(out)
    }
}

fn to_resolver_error(err: VotingError) -> ResolverError {
    match err {
        VotingError::PollNotFound(poll_id) => ResolverError::UnknownPoll(poll_id),
        VotingError::PollNotEnded(poll_id) => ResolverError::PollActive(poll_id),
        VotingError::NotCommitted { ref voter, poll_id }
        | VotingError::NotRevealed { ref voter, poll_id }
        | VotingError::LosingSide { ref voter, poll_id }
        | VotingError::HashMismatch { ref voter, poll_id } => ResolverError::NotEligible {
            voter: voter.clone(),
            poll_id,
            reason: err.to_string(),
        },
        VotingError::InvalidQuorum(_) | VotingError::Overflow => {
            ResolverError::InvalidPoll(err.to_string())
        }
        other => ResolverError::Other(other.to_string()),
    }
}

impl ChallengeResolver for PlcrVoting {
    fn start_poll(
        &mut self,
        vote_quorum: u128,
        commit_duration: u128,
        reveal_duration: u128,
        now: Timestamp,
    ) -> Result<PollId, ResolverError> {
        PlcrVoting::start_poll(self, vote_quorum, commit_duration, reveal_duration, now)
            .map_err(to_resolver_error)
    }

    fn poll_ended(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError> {
        PlcrVoting::poll_ended(self, poll_id, now).map_err(to_resolver_error)
    }

    fn is_passed(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError> {
        PlcrVoting::is_passed(self, poll_id, now).map_err(to_resolver_error)
    }

    fn total_winning_tokens(&self, poll_id: PollId, now: Timestamp) -> Result<u128, ResolverError> {
        self.get_total_number_of_tokens_for_winning_option(poll_id, now)
            .map_err(to_resolver_error)
    }

    fn num_passing_tokens(
        &self,
        voter: &Address,
        poll_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, ResolverError> {
        self.get_num_passing_tokens(voter, poll_id, salt, now)
            .map_err(to_resolver_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcr_nullables::{NullClock, NullLedger};

    fn escrow() -> Address {
        Address::new("voting")
    }

    fn alice() -> Address {
        Address::new("alice")
    }

    fn bob() -> Address {
        Address::new("bob")
    }

    fn setup() -> (PlcrVoting, NullLedger, NullClock) {
        let mut ledger = NullLedger::new()
            .with_balance("alice", 1_000)
            .with_balance("bob", 1_000);
        ledger.approve(&alice(), &escrow(), 1_000).unwrap();
        ledger.approve(&bob(), &escrow(), 1_000).unwrap();
        (
            PlcrVoting::new(escrow(), QuorumRule::default()),
            ledger,
            NullClock::new(1_000),
        )
    }

    fn commit(
        voting: &mut PlcrVoting,
        ledger: &mut NullLedger,
        voter: &Address,
        poll: PollId,
        option: VoteOption,
        salt: Salt,
        tokens: u128,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        let prev = voting.get_insert_point_for_num_tokens(voter, tokens, poll);
        voting.commit_vote(
            ledger,
            voter,
            poll,
            vote_commitment(option, salt),
            tokens,
            prev,
            now,
        )
    }

    #[test]
    fn poll_ids_start_at_one() {
        let (mut voting, _, clock) = setup();
        assert_eq!(voting.start_poll(50, 100, 100, clock.now()).unwrap(), 1);
        assert_eq!(voting.start_poll(50, 100, 100, clock.now()).unwrap(), 2);
        assert!(voting.poll_exists(2));
        assert!(!voting.poll_exists(0));
        let events = voting.drain_events();
        assert_eq!(events.len(), 2);
        assert!(voting.drain_events().is_empty());
    }

    #[test]
    fn start_poll_rejects_overflow_and_bad_quorum() {
        let (mut voting, _, clock) = setup();
        assert!(matches!(
            voting.start_poll(50, u128::MAX, 1, clock.now()),
            Err(VotingError::Overflow)
        ));
        assert!(matches!(
            voting.start_poll(101, 1, 1, clock.now()),
            Err(VotingError::InvalidQuorum(101))
        ));
        assert_eq!(voting.start_poll(50, 1, 1, clock.now()).unwrap(), 1);
    }

    #[test]
    fn commit_then_reveal_counts_tokens() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 420, 10, clock.now()).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 990);
        assert_eq!(voting.vote_token_balance(&alice()), 10);
        assert_eq!(voting.get_locked_tokens(&alice()), 10);
        assert!(voting.did_commit(&alice(), poll).unwrap());

        clock.advance(100);
        voting
            .reveal_vote(&alice(), poll, VoteOption::For, 420, clock.now())
            .unwrap();
        let p = voting.poll(poll).unwrap();
        assert_eq!(p.votes_for, 10);
        assert_eq!(p.votes_against, 0);
        assert!(voting.did_reveal(&alice(), poll).unwrap());
        assert_eq!(voting.get_locked_tokens(&alice()), 0);
    }

    #[test]
    fn wrong_salt_is_rejected() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 420, 10, clock.now()).unwrap();
        clock.advance(100);
        assert!(matches!(
            voting.reveal_vote(&alice(), poll, VoteOption::For, 421, clock.now()),
            Err(VotingError::HashMismatch { .. })
        ));
        assert!(matches!(
            voting.reveal_vote(&alice(), poll, VoteOption::Against, 420, clock.now()),
            Err(VotingError::HashMismatch { .. })
        ));
        assert_eq!(voting.poll(poll).unwrap().votes_for, 0);
        assert!(!voting.did_reveal(&alice(), poll).unwrap());
    }

    #[test]
    fn windows_are_enforced() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 1, 10, clock.now()).unwrap();
        assert!(matches!(
            voting.reveal_vote(&alice(), poll, VoteOption::For, 1, clock.now()),
            Err(VotingError::RevealPeriodInactive(_))
        ));
        clock.advance(100);
        assert!(matches!(
            commit(&mut voting, &mut ledger, &bob(), poll, VoteOption::For, 1, 10, clock.now()),
            Err(VotingError::CommitPeriodInactive(_))
        ));
        clock.advance(100);
        assert!(matches!(
            voting.reveal_vote(&alice(), poll, VoteOption::For, 1, clock.now()),
            Err(VotingError::RevealPeriodInactive(_))
        ));
    }

    #[test]
    fn double_actions_rejected() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 1, 10, clock.now()).unwrap();
        assert!(matches!(
            commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 1, 20, clock.now()),
            Err(VotingError::AlreadyCommitted { .. })
        ));
        clock.advance(100);
        voting.reveal_vote(&alice(), poll, VoteOption::For, 1, clock.now()).unwrap();
        assert!(matches!(
            voting.reveal_vote(&alice(), poll, VoteOption::For, 1, clock.now()),
            Err(VotingError::AlreadyRevealed { .. })
        ));
    }

    #[test]
    fn zero_hash_rejected() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        assert!(matches!(
            voting.commit_vote(&mut ledger, &alice(), poll, SecretHash::ZERO, 5, None, clock.now()),
            Err(VotingError::ZeroSecretHash)
        ));
    }

    #[test]
    fn partial_lock_reuses_voting_rights() {
        let (mut voting, mut ledger, clock) = setup();
        let p1 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let p2 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let p3 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p1, VoteOption::For, 1, 50, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p2, VoteOption::For, 1, 30, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p3, VoteOption::For, 1, 80, clock.now()).unwrap();

        assert_eq!(voting.vote_token_balance(&alice()), 80);
        assert_eq!(ledger.balance_of(&alice()), 920);
        assert_eq!(voting.get_locked_tokens(&alice()), 80);
        assert_eq!(voting.get_last_node(&alice()), Some(p3));

        assert!(matches!(
            voting.withdraw_voting_rights(&mut ledger, &alice(), 1),
            Err(VotingError::InsufficientVotingRights { available: 0, .. })
        ));

        clock.advance(100);
        voting.reveal_vote(&alice(), p3, VoteOption::For, 1, clock.now()).unwrap();
        assert_eq!(voting.get_locked_tokens(&alice()), 50);
        voting.withdraw_voting_rights(&mut ledger, &alice(), 30).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 950);
        assert_eq!(voting.vote_token_balance(&alice()), 50);
    }

    #[test]
    fn invalid_hint_rejected() {
        let (mut voting, mut ledger, clock) = setup();
        let p1 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let p2 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p1, VoteOption::For, 1, 50, clock.now()).unwrap();
        let err = voting
            .commit_vote(&mut ledger, &alice(), p2, vote_commitment(VoteOption::For, 1), 10, Some(p1), clock.now())
            .unwrap_err();
        assert!(matches!(err, VotingError::InvalidInsertPosition { .. }));
        assert!(!voting.did_commit(&alice(), p2).unwrap());
        assert_eq!(ledger.balance_of(&alice()), 950);
    }

    #[test]
    fn rescue_unrevealed_after_end() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 1, 40, clock.now()).unwrap();
        assert!(matches!(
            voting.rescue_tokens(&alice(), poll, clock.now()),
            Err(VotingError::PollNotEnded(_))
        ));
        clock.advance(200);
        voting.rescue_tokens(&alice(), poll, clock.now()).unwrap();
        assert_eq!(voting.get_locked_tokens(&alice()), 0);
        assert!(matches!(
            voting.rescue_tokens(&alice(), poll, clock.now()),
            Err(VotingError::NothingToRescue { .. })
        ));
        voting.withdraw_voting_rights(&mut ledger, &alice(), 40).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 1_000);
    }

    #[test]
    fn passing_tokens_require_winning_reveal() {
        let (mut voting, mut ledger, clock) = setup();
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), poll, VoteOption::For, 7, 60, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &bob(), poll, VoteOption::Against, 9, 40, clock.now()).unwrap();
        clock.advance(100);
        voting.reveal_vote(&alice(), poll, VoteOption::For, 7, clock.now()).unwrap();
        voting.reveal_vote(&bob(), poll, VoteOption::Against, 9, clock.now()).unwrap();
        assert!(matches!(
            voting.is_passed(poll, clock.now()),
            Err(VotingError::PollNotEnded(_))
        ));
        clock.advance(100);

        assert!(voting.is_passed(poll, clock.now()).unwrap());
        assert_eq!(
            voting.get_total_number_of_tokens_for_winning_option(poll, clock.now()).unwrap(),
            60
        );
        assert_eq!(voting.get_num_passing_tokens(&alice(), poll, 7, clock.now()).unwrap(), 60);
        assert!(matches!(
            voting.get_num_passing_tokens(&alice(), poll, 8, clock.now()),
            Err(VotingError::HashMismatch { .. })
        ));
        assert!(matches!(
            voting.get_num_passing_tokens(&bob(), poll, 9, clock.now()),
            Err(VotingError::LosingSide { .. })
        ));
        let resolver: &dyn ChallengeResolver = &voting;
        assert!(matches!(
            resolver.num_passing_tokens(&bob(), poll, 9, clock.now()),
            Err(ResolverError::NotEligible { .. })
        ));
    }

    #[test]
    fn batched_commit_is_all_or_nothing() {
        let (mut voting, mut ledger, clock) = setup();
        let p1 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let batch = [
            CommitRequest {
                poll_id: p1,
                secret_hash: vote_commitment(VoteOption::For, 1),
                num_tokens: 10,
                prev_poll: None,
            },
            CommitRequest {
                poll_id: 99,
                secret_hash: vote_commitment(VoteOption::For, 1),
                num_tokens: 10,
                prev_poll: None,
            },
        ];
        assert!(matches!(
            voting.commit_votes(&mut ledger, &alice(), &batch, clock.now()),
            Err(VotingError::PollNotFound(99))
        ));
        assert!(!voting.did_commit(&alice(), p1).unwrap());
        assert_eq!(voting.vote_token_balance(&alice()), 0);
        assert_eq!(ledger.balance_of(&alice()), 1_000);

        voting
            .commit_votes(&mut ledger, &alice(), &batch[..1], clock.now())
            .unwrap();
        assert!(voting.did_commit(&alice(), p1).unwrap());
        assert_eq!(ledger.balance_of(&alice()), 990);
    }

    #[test]
    fn batched_reveal_is_all_or_nothing() {
        let (mut voting, mut ledger, clock) = setup();
        let p1 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let p2 = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p1, VoteOption::For, 1, 10, clock.now()).unwrap();
        commit(&mut voting, &mut ledger, &alice(), p2, VoteOption::Against, 2, 10, clock.now()).unwrap();
        clock.advance(100);
        let bad = [
            RevealRequest { poll_id: p1, option: VoteOption::For, salt: 1 },
            RevealRequest { poll_id: p2, option: VoteOption::Against, salt: 3 },
        ];
        assert!(voting.reveal_votes(&alice(), &bad, clock.now()).is_err());
        assert_eq!(voting.poll(p1).unwrap().votes_for, 0);
        let good = [
            RevealRequest { poll_id: p1, option: VoteOption::For, salt: 1 },
            RevealRequest { poll_id: p2, option: VoteOption::Against, salt: 2 },
        ];
        voting.reveal_votes(&alice(), &good, clock.now()).unwrap();
        assert_eq!(voting.poll(p2).unwrap().votes_against, 10);
    }

    #[test]
    fn commit_without_allowance_fails_cleanly() {
        let mut ledger = NullLedger::new().with_balance("carol", 100);
        let mut voting = PlcrVoting::new(escrow(), QuorumRule::default());
        let clock = NullClock::new(0);
        let poll = voting.start_poll(50, 100, 100, clock.now()).unwrap();
        let carol = Address::new("carol");
        let err = commit(&mut voting, &mut ledger, &carol, poll, VoteOption::For, 1, 10, clock.now())
            .unwrap_err();
        assert!(matches!(err, VotingError::Ledger(_)));
        assert!(!voting.did_commit(&carol, poll).unwrap());
        assert_eq!(voting.get_locked_tokens(&carol), 0);
    }
}
