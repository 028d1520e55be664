//! The single global sequencer.
//!
//! Every mutating operation goes through [`Sequencer::transact`]: the component
//! state is cloned, the operation runs against the clone and a [`StagedLedger`]
//! over the authoritative ledger, and only if it succeeds is the ledger journal
//! applied and the clone swapped in. Buffered events are published afterwards,
//! so a rejected operation changes nothing and emits nothing.

use serde::{Deserialize, Serialize};
use tcr_challenge::Challenge;
use tcr_ledger::{LedgerError, StagedLedger, TokenLedger};
use tcr_parameterizer::{ParamProposal, ParamStore, Parameterizer, ProposalOutcome, ProposalPhase};
use tcr_registry::{Listing, ListingPhase, Registry, StatusUpdate};
use tcr_types::{Address, ListingHash, Param, PollId, ProposalId, Salt, SecretHash, TcrEvent, Timestamp, VoteOption};
use tcr_voting::{CommitRequest, PlcrVoting, PollPhase, RevealRequest};
use tracing::{debug, error, info, warn};

use crate::config::TcrConfig;
use crate::events::EventBus;
use crate::TcrError;

/// Everything the sequencer commits or rolls back as a unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TcrState {
    pub voting: PlcrVoting,
    pub parameterizer: Parameterizer,
    pub registry: Registry,
}

impl TcrState {
    pub fn new(config: &TcrConfig) -> Self {
        Self {
            voting: PlcrVoting::new(config.voting_escrow.clone(), config.quorum_rule),
            parameterizer: Parameterizer::with_process_by_buffer(
                config.parameterizer_escrow.clone(),
                &config.params,
                u128::from(config.process_by_buffer_secs),
            ),
            registry: Registry::new(config.registry_name.clone(), config.registry_escrow.clone()),
        }
    }

    /// Buffered events of all three components. Voting first: a challenge's
    /// poll is created before the challenge that owns it.
    fn drain_events(&mut self) -> Vec<TcrEvent> {
        let mut events = self.voting.drain_events();
        events.extend(self.parameterizer.drain_events());
        events.extend(self.registry.drain_events());
        events
    }
}

pub struct Sequencer<L: TokenLedger> {
    ledger: L,
    state: TcrState,
    events: EventBus<TcrEvent>,
    committed: u64,
}

impl<L: TokenLedger> Sequencer<L> {
    pub fn new(config: &TcrConfig, ledger: L) -> Result<Self, TcrError> {
        config.validate()?;
        info!(registry = %config.registry_name, quorum_rule = ?config.quorum_rule, "sequencer started");
        Ok(Self {
            ledger,
            state: TcrState::new(config),
            events: EventBus::new(),
            committed: 0,
        })
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TcrEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Number of operations committed so far.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Run `op` against a copy of the state and a staged ledger; commit both only
    /// if it succeeds.
    fn transact<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut TcrState, &mut dyn TokenLedger) -> Result<T, TcrError>,
    ) -> Result<T, TcrError> {
        let mut scratch = self.state.clone();
        let staged = {
            let mut staged = StagedLedger::new(&self.ledger);
            op(&mut scratch, &mut staged).map(|out| (out, staged.into_journal()))
        };
        let (out, journal) = match staged {
            Ok(staged) => staged,
            Err(e) => {
                debug!(op = name, error = %e, "operation rejected");
                return Err(e);
            }
        };

        let ops = journal.len();
        if let Err(e) = journal.apply(&mut self.ledger) {
            match e {
                LedgerError::CompensationFailed { .. } => {
                    error!(op = name, error = %e, "ledger left partially applied, state not committed")
                }
                _ => warn!(op = name, error = %e, "ledger refused staged transfers, operation rolled back"),
            }
            return Err(e.into());
        }

        let events = scratch.drain_events();
        self.state = scratch;
        self.committed += 1;
        debug!(op = name, seq = self.committed, transfers = ops, events = events.len(), "operation committed");
        self.publish(&events);
        Ok(out)
    }

    fn publish(&self, events: &[TcrEvent]) {
        for event in events {
            match serde_json::to_string(event) {
                Ok(json) => info!(kind = event.kind(), event = %json, "tcr event"),
                Err(e) => warn!(kind = event.kind(), error = %e, "event not serializable"),
            }
            self.events.emit(event);
        }
    }

    // ── Registry ──────────────────────────────────────────────────────────

    pub fn apply(
        &mut self,
        applicant: &Address,
        hash: ListingHash,
        amount: u128,
        data: &str,
        now: Timestamp,
    ) -> Result<(), TcrError> {
        self.transact("apply", |s, ledger| {
            s.registry
                .apply(ledger, s.parameterizer.params(), applicant, hash, amount, data, now)?;
            Ok(())
        })
    }

    pub fn deposit(&mut self, owner: &Address, hash: ListingHash, amount: u128) -> Result<(), TcrError> {
        self.transact("deposit", |s, ledger| Ok(s.registry.deposit(ledger, owner, hash, amount)?))
    }

    pub fn withdraw(&mut self, owner: &Address, hash: ListingHash, amount: u128) -> Result<(), TcrError> {
        self.transact("withdraw", |s, ledger| {
            Ok(s.registry
                .withdraw(ledger, s.parameterizer.params(), owner, hash, amount)?)
        })
    }

    pub fn init_exit(&mut self, owner: &Address, hash: ListingHash, now: Timestamp) -> Result<(), TcrError> {
        self.transact("init_exit", |s, _| {
            Ok(s.registry
                .init_exit(s.parameterizer.params(), owner, hash, now)?)
        })
    }

    pub fn finalize_exit(&mut self, owner: &Address, hash: ListingHash, now: Timestamp) -> Result<(), TcrError> {
        self.transact("finalize_exit", |s, ledger| {
            Ok(s.registry.finalize_exit(ledger, owner, hash, now)?)
        })
    }

    /// Open a challenge. `None` means the listing was under-funded and has been
    /// removed instead.
    pub fn challenge(
        &mut self,
        challenger: &Address,
        hash: ListingHash,
        data: &str,
        now: Timestamp,
    ) -> Result<Option<PollId>, TcrError> {
        self.transact("challenge", |s, ledger| {
            Ok(s.registry.challenge(
                ledger,
                &mut s.voting,
                s.parameterizer.params(),
                challenger,
                hash,
                data,
                now,
            )?)
        })
    }

    pub fn update_status(&mut self, hash: ListingHash, now: Timestamp) -> Result<StatusUpdate, TcrError> {
        self.transact("update_status", |s, ledger| {
            Ok(s.registry.update_status(ledger, &s.voting, hash, now)?)
        })
    }

    pub fn update_statuses(
        &mut self,
        hashes: &[ListingHash],
        now: Timestamp,
    ) -> Result<Vec<StatusUpdate>, TcrError> {
        self.transact("update_statuses", |s, ledger| {
            Ok(s.registry.update_statuses(ledger, &s.voting, hashes, now)?)
        })
    }

    pub fn claim_reward(
        &mut self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        self.transact("claim_reward", |s, ledger| {
            Ok(s.registry
                .claim_reward(ledger, &s.voting, voter, challenge_id, salt, now)?)
        })
    }

    pub fn claim_rewards(
        &mut self,
        voter: &Address,
        claims: &[(PollId, Salt)],
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        self.transact("claim_rewards", |s, ledger| {
            Ok(s.registry.claim_rewards(ledger, &s.voting, voter, claims, now)?)
        })
    }

    // ── Parameterizer ─────────────────────────────────────────────────────

    pub fn propose_reparameterization(
        &mut self,
        proposer: &Address,
        name: Param,
        value: u128,
        now: Timestamp,
    ) -> Result<ProposalId, TcrError> {
        self.transact("propose_reparameterization", |s, ledger| {
            Ok(s.parameterizer
                .propose_reparameterization(ledger, proposer, name, value, now)?)
        })
    }

    pub fn challenge_reparameterization(
        &mut self,
        challenger: &Address,
        prop_id: ProposalId,
        now: Timestamp,
    ) -> Result<PollId, TcrError> {
        self.transact("challenge_reparameterization", |s, ledger| {
            Ok(s.parameterizer.challenge_reparameterization(
                ledger,
                &mut s.voting,
                challenger,
                prop_id,
                now,
            )?)
        })
    }

    pub fn process_proposal(&mut self, prop_id: ProposalId, now: Timestamp) -> Result<ProposalOutcome, TcrError> {
        self.transact("process_proposal", |s, ledger| {
            Ok(s.parameterizer
                .process_proposal(ledger, &mut s.voting, prop_id, now)?)
        })
    }

    pub fn claim_proposal_reward(
        &mut self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        self.transact("claim_proposal_reward", |s, ledger| {
            Ok(s.parameterizer
                .claim_reward(ledger, &s.voting, voter, challenge_id, salt, now)?)
        })
    }

    pub fn claim_proposal_rewards(
        &mut self,
        voter: &Address,
        claims: &[(PollId, Salt)],
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        self.transact("claim_proposal_rewards", |s, ledger| {
            Ok(s.parameterizer
                .claim_rewards(ledger, &s.voting, voter, claims, now)?)
        })
    }

    // ── Voting ────────────────────────────────────────────────────────────

    pub fn request_voting_rights(&mut self, voter: &Address, num_tokens: u128) -> Result<(), TcrError> {
        self.transact("request_voting_rights", |s, ledger| {
            Ok(s.voting.request_voting_rights(ledger, voter, num_tokens)?)
        })
    }

    pub fn withdraw_voting_rights(&mut self, voter: &Address, num_tokens: u128) -> Result<(), TcrError> {
        self.transact("withdraw_voting_rights", |s, ledger| {
            Ok(s.voting.withdraw_voting_rights(ledger, voter, num_tokens)?)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn commit_vote(
        &mut self,
        voter: &Address,
        poll_id: PollId,
        secret_hash: SecretHash,
        num_tokens: u128,
        prev_poll: Option<PollId>,
        now: Timestamp,
    ) -> Result<(), TcrError> {
        self.transact("commit_vote", |s, ledger| {
            Ok(s.voting
                .commit_vote(ledger, voter, poll_id, secret_hash, num_tokens, prev_poll, now)?)
        })
    }

    pub fn commit_votes(&mut self, voter: &Address, batch: &[CommitRequest], now: Timestamp) -> Result<(), TcrError> {
        self.transact("commit_votes", |s, ledger| {
            Ok(s.voting.commit_votes(ledger, voter, batch, now)?)
        })
    }

    pub fn reveal_vote(
        &mut self,
        voter: &Address,
        poll_id: PollId,
        option: VoteOption,
        salt: Salt,
        now: Timestamp,
    ) -> Result<(), TcrError> {
        self.transact("reveal_vote", |s, _| {
            Ok(s.voting.reveal_vote(voter, poll_id, option, salt, now)?)
        })
    }

    pub fn reveal_votes(&mut self, voter: &Address, batch: &[RevealRequest], now: Timestamp) -> Result<(), TcrError> {
        self.transact("reveal_votes", |s, _| Ok(s.voting.reveal_votes(voter, batch, now)?))
    }

    pub fn rescue_tokens(&mut self, voter: &Address, poll_id: PollId, now: Timestamp) -> Result<(), TcrError> {
        self.transact("rescue_tokens", |s, _| Ok(s.voting.rescue_tokens(voter, poll_id, now)?))
    }

    pub fn rescue_tokens_in_multiple_polls(
        &mut self,
        voter: &Address,
        poll_ids: &[PollId],
        now: Timestamp,
    ) -> Result<(), TcrError> {
        self.transact("rescue_tokens_in_multiple_polls", |s, _| {
            Ok(s.voting.rescue_tokens_in_multiple_polls(voter, poll_ids, now)?)
        })
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct access to the token ledger, for the token's own operations
    /// (minting, approvals) that happen outside the registry.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn state(&self) -> &TcrState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.state.registry
    }

    pub fn parameterizer(&self) -> &Parameterizer {
        &self.state.parameterizer
    }

    pub fn voting(&self) -> &PlcrVoting {
        &self.state.voting
    }

    pub fn params(&self) -> &ParamStore {
        self.state.parameterizer.params()
    }

    pub fn get(&self, param: Param) -> u128 {
        self.state.parameterizer.get(param)
    }

    pub fn listing(&self, hash: ListingHash) -> Option<&Listing> {
        self.state.registry.listing(hash)
    }

    pub fn is_whitelisted(&self, hash: ListingHash) -> bool {
        self.state.registry.is_whitelisted(hash)
    }

    pub fn listing_phase(&self, hash: ListingHash, now: Timestamp) -> Result<ListingPhase, TcrError> {
        Ok(self.state.registry.phase(hash, &self.state.voting, now)?)
    }

    pub fn challenge_can_be_resolved(&self, hash: ListingHash, now: Timestamp) -> Result<bool, TcrError> {
        Ok(self
            .state
            .registry
            .challenge_can_be_resolved(hash, &self.state.voting, now)?)
    }

    pub fn listing_challenge(&self, challenge_id: PollId) -> Option<&Challenge> {
        self.state.registry.challenge_record(challenge_id)
    }

    pub fn voter_reward(
        &self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        Ok(self
            .state
            .registry
            .voter_reward(&self.state.voting, voter, challenge_id, salt, now)?)
    }

    pub fn proposal(&self, prop_id: ProposalId) -> Option<&ParamProposal> {
        self.state.parameterizer.proposal(prop_id)
    }

    pub fn proposal_phase(&self, prop_id: ProposalId, now: Timestamp) -> Result<ProposalPhase, TcrError> {
        Ok(self
            .state
            .parameterizer
            .phase(prop_id, &self.state.voting, now)?)
    }

    pub fn proposal_voter_reward(
        &self,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, TcrError> {
        Ok(self
            .state
            .parameterizer
            .voter_reward(&self.state.voting, voter, challenge_id, salt, now)?)
    }

    pub fn poll_phase(&self, poll_id: PollId, now: Timestamp) -> Result<PollPhase, TcrError> {
        Ok(self.state.voting.poll_phase(poll_id, now)?)
    }

    pub fn get_insert_point_for_num_tokens(
        &self,
        voter: &Address,
        num_tokens: u128,
        poll_id: PollId,
    ) -> Option<PollId> {
        self.state
            .voting
            .get_insert_point_for_num_tokens(voter, num_tokens, poll_id)
    }
}
