//! The parameterizer state machine.

use crate::error::ParameterizerError;
use crate::proposal::{ParamProposal, ProposalPhase};
use crate::store::ParamStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_challenge::{Challenge, ChallengeBook, ChallengeResolver};
use tcr_crypto::proposal_id;
use tcr_ledger::{StagedLedger, TokenLedger};
use tcr_types::{
    Address, Param, ParamDefaults, PollId, ProposalId, Salt, SubjectKind, TcrEvent, Timestamp,
};
use tracing::{debug, info};

/// Seconds past the end of a proposal's challenge window before it goes stale.
pub const PROCESS_BY_BUFFER: u128 = 604_800;

/// How `process_proposal` settled a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Unchallenged and applied.
    Accepted,
    /// Deadline passed; the proposer was paid but nothing was applied.
    Expired,
    /// The poll upheld the proposal. `applied` is false when it came in after
    /// `process_by`.
    ChallengeFailed { applied: bool },
    /// The challenger won and took the stakes.
    ChallengeSucceeded,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameterizer {
    escrow: Address,
    params: ParamStore,
    proposals: BTreeMap<ProposalId, ParamProposal>,
    live_by_name: BTreeMap<Param, ProposalId>,
    nonce: u64,
    challenges: ChallengeBook,
    process_by_buffer: u128,
    #[serde(skip)]
    pending_events: Vec<TcrEvent>,
}

impl Parameterizer {
    pub fn new(escrow: Address, defaults: &ParamDefaults) -> Self {
        Self::with_process_by_buffer(escrow, defaults, PROCESS_BY_BUFFER)
    }

    pub fn with_process_by_buffer(
        escrow: Address,
        defaults: &ParamDefaults,
        process_by_buffer: u128,
    ) -> Self {
        Self {
            escrow,
            params: ParamStore::new(defaults),
            proposals: BTreeMap::new(),
            live_by_name: BTreeMap::new(),
            nonce: 0,
            challenges: ChallengeBook::new(SubjectKind::Proposal),
            process_by_buffer,
            pending_events: Vec::new(),
        }
    }

    pub fn escrow(&self) -> &Address {
        &self.escrow
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn get(&self, param: Param) -> u128 {
        self.params.get(param)
    }

    pub fn drain_events(&mut self) -> Vec<TcrEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// `now + pApplyStageLength + pCommitStageLength + pRevealStageLength + buffer`
    /// under `params`, together with the application deadline.
    fn deadlines(
        &self,
        params: &ParamStore,
        now: Timestamp,
    ) -> Result<(Timestamp, Timestamp), ParameterizerError> {
        let app_expiry = now
            .checked_add_secs(params.get(Param::PApplyStageLength))
            .ok_or(ParameterizerError::ProcessByOverflow)?;
        let process_by = params
            .get(Param::PCommitStageLength)
            .checked_add(params.get(Param::PRevealStageLength))
            .and_then(|secs| secs.checked_add(self.process_by_buffer))
            .and_then(|secs| app_expiry.checked_add_secs(secs))
            .ok_or(ParameterizerError::ProcessByOverflow)?;
        Ok((app_expiry, process_by))
    }

    // ── Proposals ─────────────────────────────────────────────────────────

    /// Stake `pMinDeposit` on changing `name` to `value`.
    pub fn propose_reparameterization(
        &mut self,
        ledger: &mut dyn TokenLedger,
        proposer: &Address,
        name: Param,
        value: u128,
        now: Timestamp,
    ) -> Result<ProposalId, ParameterizerError> {
        if self.get(name) == value {
            return Err(ParameterizerError::NoOpProposal { name, value });
        }
        if let Some(existing) = self.live_by_name.get(&name) {
            return Err(ParameterizerError::ProposalPending {
                name,
                existing: *existing,
            });
        }
        name.validate(value)?;
        let (app_expiry, process_by) = self.deadlines(&self.params, now)?;

        let nonce = self.nonce.checked_add(1).ok_or(ParameterizerError::Overflow)?;
        let prop_id = proposal_id(name, value, nonce);
        if self.proposals.contains_key(&prop_id) {
            return Err(ParameterizerError::ProposalExists(prop_id));
        }
        let deposit = self.params.p_min_deposit();
        ledger.transfer_from(&self.escrow, proposer, &self.escrow, deposit)?;

        self.nonce = nonce;
        self.proposals.insert(
            prop_id,
            ParamProposal {
                app_expiry,
                challenge_id: None,
                deposit,
                name,
                value,
                owner: proposer.clone(),
                process_by,
            },
        );
        self.live_by_name.insert(name, prop_id);
        info!(%prop_id, %name, value, deposit, %proposer, "reparameterization proposed");
        self.pending_events.push(TcrEvent::NewProposal {
            prop_id,
            name,
            value,
            deposit,
            app_end: app_expiry,
            proposer: proposer.clone(),
        });
        Ok(prop_id)
    }

    /// Match the proposal's deposit and open a poll on it.
    pub fn challenge_reparameterization(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &mut dyn ChallengeResolver,
        challenger: &Address,
        prop_id: ProposalId,
        now: Timestamp,
    ) -> Result<PollId, ParameterizerError> {
        let prop = self.require(prop_id)?;
        if prop.is_challenged() {
            return Err(ParameterizerError::AlreadyChallenged(prop_id));
        }
        if prop.is_expired(now) {
            return Err(ParameterizerError::ProposalExpired(prop_id));
        }
        let stake = prop.deposit;
        let quorum = self.get(Param::PVoteQuorum);
        let commit_len = self.get(Param::PCommitStageLength);
        let reveal_len = self.get(Param::PRevealStageLength);
        let dispensation_pct = self.get(Param::PDispensationPct);
        let commit_end = now
            .checked_add_secs(commit_len)
            .ok_or(ParameterizerError::Overflow)?;
        let reveal_end = commit_end
            .checked_add_secs(reveal_len)
            .ok_or(ParameterizerError::Overflow)?;

        ledger.transfer_from(&self.escrow, challenger, &self.escrow, stake)?;
        let poll_id = resolver.start_poll(quorum, commit_len, reveal_len, now)?;
        self.challenges
            .open(poll_id, challenger.clone(), stake, dispensation_pct)?;
        if let Some(prop) = self.proposals.get_mut(&prop_id) {
            prop.challenge_id = Some(poll_id);
        }

        info!(%prop_id, poll_id, %challenger, stake, "proposal challenged");
        self.pending_events.push(TcrEvent::ProposalChallenged {
            prop_id,
            challenge_id: poll_id,
            challenger: challenger.clone(),
            commit_end,
            reveal_end,
        });
        Ok(poll_id)
    }

    /// Settle a proposal: apply it, resolve its challenge, or refund it once stale.
    pub fn process_proposal(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &mut dyn ChallengeResolver,
        prop_id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalOutcome, ParameterizerError> {
        let prop = self.require(prop_id)?.clone();
        let resolvable = self.challenge_can_be_resolved(prop_id, &*resolver, now)?;

        let outcome = match prop.phase(now, resolvable) {
            ProposalPhase::Settable => {
                let next = self.with_value(&prop, now)?;
                ledger.transfer(&self.escrow, &prop.owner, prop.deposit)?;
                self.params = next;
                info!(%prop_id, name = %prop.name, value = prop.value, "proposal accepted");
                self.pending_events.push(TcrEvent::ProposalAccepted {
                    prop_id,
                    name: prop.name,
                    value: prop.value,
                });
                ProposalOutcome::Accepted
            }
            ProposalPhase::ChallengeResolvable => {
                self.resolve_challenge(ledger, &*resolver, prop_id, &prop, now)?
            }
            ProposalPhase::Expired => {
                ledger.transfer(&self.escrow, &prop.owner, prop.deposit)?;
                info!(%prop_id, "proposal expired unprocessed");
                self.pending_events
                    .push(TcrEvent::ProposalExpired { prop_id });
                ProposalOutcome::Expired
            }
            ProposalPhase::Applied => {
                return Err(ParameterizerError::ApplicationPeriodActive(prop_id))
            }
            ProposalPhase::Challenged => {
                return Err(ParameterizerError::ChallengeUnresolved(prop_id))
            }
        };

        self.proposals.remove(&prop_id);
        self.live_by_name.remove(&prop.name);
        Ok(outcome)
    }

    /// The parameters with the proposal's value written, provided a future
    /// proposal's deadline stays computable under them.
    fn with_value(&self, prop: &ParamProposal, now: Timestamp) -> Result<ParamStore, ParameterizerError> {
        let mut next = self.params.clone();
        next.set(prop.name, prop.value)?;
        self.deadlines(&next, now)?;
        Ok(next)
    }

    fn resolve_challenge(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        prop_id: ProposalId,
        prop: &ParamProposal,
        now: Timestamp,
    ) -> Result<ProposalOutcome, ParameterizerError> {
        let challenge_id = prop
            .challenge_id
            .ok_or(ParameterizerError::NotChallenged(prop_id))?;
        let resolution = self.challenges.resolve(challenge_id, resolver, now)?;

        let outcome = if resolution.passed {
            let applied = !prop.is_expired(now);
            let next = if applied {
                Some(self.with_value(prop, now)?)
            } else {
                None
            };
            ledger.transfer(&self.escrow, &prop.owner, resolution.winner_reward)?;
            if let Some(next) = next {
                self.params = next;
            }
            self.pending_events.push(TcrEvent::ChallengeFailed {
                subject: SubjectKind::Proposal,
                challenge_id,
                reward_pool: resolution.reward_pool,
                total_tokens: resolution.total_tokens,
            });
            if applied {
                self.pending_events.push(TcrEvent::ProposalAccepted {
                    prop_id,
                    name: prop.name,
                    value: prop.value,
                });
            } else {
                self.pending_events
                    .push(TcrEvent::ProposalExpired { prop_id });
            }
            ProposalOutcome::ChallengeFailed { applied }
        } else {
            ledger.transfer(&self.escrow, &resolution.challenger, resolution.winner_reward)?;
            self.pending_events.push(TcrEvent::ChallengeSucceeded {
                subject: SubjectKind::Proposal,
                challenge_id,
                reward_pool: resolution.reward_pool,
                total_tokens: resolution.total_tokens,
            });
            ProposalOutcome::ChallengeSucceeded
        };
        info!(%prop_id, challenge_id, ?outcome, reward = resolution.winner_reward, "proposal challenge settled");
        Ok(outcome)
    }

    // ── Voter rewards ─────────────────────────────────────────────────────

    pub fn claim_reward(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, ParameterizerError> {
        let reward = self
            .challenges
            .claim_reward(voter, challenge_id, salt, resolver, now)?;
        ledger.transfer(&self.escrow, voter, reward)?;
        debug!(challenge_id, %voter, reward, "proposal challenge reward paid");
        self.pending_events.push(TcrEvent::RewardClaimed {
            subject: SubjectKind::Proposal,
            challenge_id,
            reward,
            voter: voter.clone(),
        });
        Ok(reward)
    }

    /// Claim several rewards; either every claim is paid or none.
    pub fn claim_rewards(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        voter: &Address,
        claims: &[(PollId, Salt)],
        now: Timestamp,
    ) -> Result<u128, ParameterizerError> {
        let mut scratch = self.clone();
        let (total, journal) = {
            let mut staged = StagedLedger::new(&*ledger);
            let mut total = 0u128;
            for (challenge_id, salt) in claims {
                let reward =
                    scratch.claim_reward(&mut staged, resolver, voter, *challenge_id, *salt, now)?;
                total = total.checked_add(reward).ok_or(ParameterizerError::Overflow)?;
            }
            (total, staged.into_journal())
        };
        journal.apply(ledger)?;
        *self = scratch;
        Ok(total)
    }

    pub fn voter_reward(
        &self,
        resolver: &dyn ChallengeResolver,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, ParameterizerError> {
        Ok(self
            .challenges
            .voter_reward(voter, challenge_id, salt, resolver, now)?)
    }

    pub fn token_claims(&self, challenge_id: PollId, voter: &Address) -> bool {
        self.challenges.token_claims(challenge_id, voter)
    }

    // ── Views ─────────────────────────────────────────────────────────────

    fn require(&self, prop_id: ProposalId) -> Result<&ParamProposal, ParameterizerError> {
        self.proposals
            .get(&prop_id)
            .ok_or(ParameterizerError::ProposalNotFound(prop_id))
    }

    pub fn proposal(&self, prop_id: ProposalId) -> Option<&ParamProposal> {
        self.proposals.get(&prop_id)
    }

    pub fn prop_exists(&self, prop_id: ProposalId) -> bool {
        self.proposals.contains_key(&prop_id)
    }

    /// The pending proposal for `name`, if any.
    pub fn live_proposal(&self, name: Param) -> Option<ProposalId> {
        self.live_by_name.get(&name).copied()
    }

    pub fn can_be_set(&self, prop_id: ProposalId, now: Timestamp) -> bool {
        self.proposal(prop_id).is_some_and(|p| p.can_be_set(now))
    }

    pub fn challenge_can_be_resolved(
        &self,
        prop_id: ProposalId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<bool, ParameterizerError> {
        match self.proposal(prop_id).and_then(|p| p.challenge_id) {
            Some(challenge_id) => Ok(self
                .challenges
                .can_be_resolved(challenge_id, resolver, now)?),
            None => Ok(false),
        }
    }

    /// What the winner of the proposal's challenge would receive.
    pub fn challenge_winner_reward(
        &self,
        prop_id: ProposalId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<u128, ParameterizerError> {
        let challenge_id = self
            .require(prop_id)?
            .challenge_id
            .ok_or(ParameterizerError::NotChallenged(prop_id))?;
        Ok(self
            .challenges
            .determine_reward(challenge_id, resolver, now)?)
    }

    pub fn challenge(&self, challenge_id: PollId) -> Option<&Challenge> {
        self.challenges.get(challenge_id)
    }

    pub fn phase(
        &self,
        prop_id: ProposalId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<ProposalPhase, ParameterizerError> {
        let resolvable = self.challenge_can_be_resolved(prop_id, resolver, now)?;
        Ok(self.require(prop_id)?.phase(now, resolvable))
    }
}
