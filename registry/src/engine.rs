//! The registry state machine.

use crate::error::RegistryError;
use crate::listing::{Listing, ListingPhase, StatusUpdate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tcr_challenge::{Challenge, ChallengeBook, ChallengeResolver};
use tcr_ledger::{StagedLedger, TokenLedger};
use tcr_parameterizer::ParamStore;
use tcr_types::{Address, ListingHash, Param, PollId, Salt, SubjectKind, TcrEvent, Timestamp};
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registry {
    name: String,
    escrow: Address,
    listings: BTreeMap<ListingHash, Listing>,
    challenges: ChallengeBook,
    #[serde(skip)]
    pending_events: Vec<TcrEvent>,
}

impl Registry {
    pub fn new(name: impl Into<String>, escrow: Address) -> Self {
        Self {
            name: name.into(),
            escrow,
            listings: BTreeMap::new(),
            challenges: ChallengeBook::new(SubjectKind::Listing),
            pending_events: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn escrow(&self) -> &Address {
        &self.escrow
    }

    pub fn drain_events(&mut self) -> Vec<TcrEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn require(&self, hash: ListingHash) -> Result<&Listing, RegistryError> {
        self.listings
            .get(&hash)
            .ok_or(RegistryError::ListingNotFound(hash))
    }

    fn require_owned(&self, hash: ListingHash, caller: &Address) -> Result<&Listing, RegistryError> {
        let listing = self.require(hash)?;
        if &listing.owner != caller {
            return Err(RegistryError::NotOwner {
                listing: hash,
                caller: caller.clone(),
            });
        }
        Ok(listing)
    }

    fn listing_mut(&mut self, hash: ListingHash) -> Result<&mut Listing, RegistryError> {
        self.listings
            .get_mut(&hash)
            .ok_or(RegistryError::ListingNotFound(hash))
    }

    // ── Listing owner operations ──────────────────────────────────────────

    /// Stake `amount` to list `hash`. The caller becomes its owner.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &mut self,
        ledger: &mut dyn TokenLedger,
        params: &ParamStore,
        applicant: &Address,
        hash: ListingHash,
        amount: u128,
        data: &str,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        if self.listings.contains_key(&hash) {
            return Err(RegistryError::ListingExists(hash));
        }
        let min = params.min_deposit();
        if amount < min {
            return Err(RegistryError::DepositBelowMinimum { amount, min });
        }
        let application_expiry = now
            .checked_add_secs(params.get(Param::ApplyStageLength))
            .ok_or(RegistryError::Overflow)?;

        ledger.transfer_from(&self.escrow, applicant, &self.escrow, amount)?;
        self.listings.insert(
            hash,
            Listing::new(applicant.clone(), amount, application_expiry),
        );
        info!(registry = %self.name, listing = %hash, %applicant, amount, "application submitted");
        self.pending_events.push(TcrEvent::Application {
            listing: hash,
            applicant: applicant.clone(),
            deposit: amount,
            app_end: application_expiry,
            data: data.to_string(),
        });
        Ok(())
    }

    /// Add to the unstaked deposit of an owned listing.
    pub fn deposit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: &Address,
        hash: ListingHash,
        amount: u128,
    ) -> Result<(), RegistryError> {
        let new_total = self
            .require_owned(hash, owner)?
            .unstaked_deposit
            .checked_add(amount)
            .ok_or(RegistryError::Overflow)?;
        ledger.transfer_from(&self.escrow, owner, &self.escrow, amount)?;
        self.listing_mut(hash)?.unstaked_deposit = new_total;
        debug!(listing = %hash, amount, new_total, "deposit added");
        self.pending_events.push(TcrEvent::Deposit {
            listing: hash,
            added: amount,
            new_total,
            owner: owner.clone(),
        });
        Ok(())
    }

    /// Take back unstaked deposit above `minDeposit`.
    pub fn withdraw(
        &mut self,
        ledger: &mut dyn TokenLedger,
        params: &ParamStore,
        owner: &Address,
        hash: ListingHash,
        amount: u128,
    ) -> Result<(), RegistryError> {
        let available = self.require_owned(hash, owner)?.unstaked_deposit;
        let remaining = available
            .checked_sub(amount)
            .ok_or(RegistryError::InsufficientDeposit {
                requested: amount,
                available,
            })?;
        let min = params.min_deposit();
        if remaining < min {
            return Err(RegistryError::WithdrawBelowMinimum { remaining, min });
        }
        ledger.transfer(&self.escrow, owner, amount)?;
        self.listing_mut(hash)?.unstaked_deposit = remaining;
        debug!(listing = %hash, amount, remaining, "deposit withdrawn");
        self.pending_events.push(TcrEvent::Withdrawal {
            listing: hash,
            withdrew: amount,
            new_total: remaining,
            owner: owner.clone(),
        });
        Ok(())
    }

    /// Start the exit delay of a whitelisted listing.
    pub fn init_exit(
        &mut self,
        params: &ParamStore,
        owner: &Address,
        hash: ListingHash,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let listing = self.require_owned(hash, owner)?;
        if !listing.whitelisted {
            return Err(RegistryError::NotWhitelisted(hash));
        }
        if self.challenge_exists(hash) {
            return Err(RegistryError::ChallengeOpen(hash));
        }
        if !listing.can_init_exit(now) {
            return Err(RegistryError::ExitAlreadyInitiated {
                listing: hash,
                closes: listing.exit_time_expiry.unwrap_or_default(),
            });
        }
        let exit_time = now
            .checked_add_secs(params.get(Param::ExitTimeDelay))
            .ok_or(RegistryError::Overflow)?;
        let exit_time_expiry = exit_time
            .checked_add_secs(params.get(Param::ExitPeriodLen))
            .ok_or(RegistryError::Overflow)?;

        let listing = self.listing_mut(hash)?;
        listing.exit_time = Some(exit_time);
        listing.exit_time_expiry = Some(exit_time_expiry);
        info!(listing = %hash, %exit_time, %exit_time_expiry, "exit initiated");
        self.pending_events.push(TcrEvent::ExitInitialized {
            listing: hash,
            exit_time,
            exit_delay_end: exit_time_expiry,
            owner: owner.clone(),
        });
        Ok(())
    }

    /// Remove the listing during its exit window and return the whole deposit.
    pub fn finalize_exit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: &Address,
        hash: ListingHash,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let listing = self.require_owned(hash, owner)?;
        if !listing.whitelisted {
            return Err(RegistryError::NotWhitelisted(hash));
        }
        if self.challenge_exists(hash) {
            return Err(RegistryError::ChallengeOpen(hash));
        }
        let (Some(opens), Some(closes)) = (listing.exit_time, listing.exit_time_expiry) else {
            return Err(RegistryError::ExitNotInitiated(hash));
        };
        if !listing.exit_window_open(now) {
            return Err(RegistryError::ExitWindowClosed {
                listing: hash,
                opens,
                closes,
            });
        }
        self.reset_listing(ledger, hash)?;
        info!(listing = %hash, %owner, "listing withdrawn");
        self.pending_events.push(TcrEvent::ListingWithdrawn {
            listing: hash,
            owner: owner.clone(),
        });
        Ok(())
    }

    /// Delete the listing and refund what is left of its unstaked deposit.
    fn reset_listing(
        &mut self,
        ledger: &mut dyn TokenLedger,
        hash: ListingHash,
    ) -> Result<Listing, RegistryError> {
        let listing = self.require(hash)?.clone();
        if listing.unstaked_deposit > 0 {
            ledger.transfer(&self.escrow, &listing.owner, listing.unstaked_deposit)?;
        }
        self.listings.remove(&hash);
        Ok(listing)
    }

    // ── Challenges ────────────────────────────────────────────────────────

    /// Challenge an application or a whitelisted listing.
    ///
    /// A listing whose unstaked deposit has fallen below `minDeposit` is removed on
    /// the spot without a poll and without touching the challenger; `None` is
    /// returned in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn challenge(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &mut dyn ChallengeResolver,
        params: &ParamStore,
        challenger: &Address,
        hash: ListingHash,
        data: &str,
        now: Timestamp,
    ) -> Result<Option<PollId>, RegistryError> {
        let unstaked = self.require(hash)?.unstaked_deposit;
        if self.challenge_exists(hash) {
            return Err(RegistryError::ChallengeOpen(hash));
        }
        let stake = params.min_deposit();
        if unstaked < stake {
            self.reset_listing(ledger, hash)?;
            info!(listing = %hash, "listing touched and removed");
            self.pending_events
                .push(TcrEvent::TouchAndRemoved { listing: hash });
            return Ok(None);
        }

        let commit_len = params.get(Param::CommitStageLength);
        let reveal_len = params.get(Param::RevealStageLength);
        let commit_end = now
            .checked_add_secs(commit_len)
            .ok_or(RegistryError::Overflow)?;
        let reveal_end = commit_end
            .checked_add_secs(reveal_len)
            .ok_or(RegistryError::Overflow)?;

        ledger.transfer_from(&self.escrow, challenger, &self.escrow, stake)?;
        let poll_id = resolver.start_poll(
            params.get(Param::VoteQuorum),
            commit_len,
            reveal_len,
            now,
        )?;
        self.challenges.open(
            poll_id,
            challenger.clone(),
            stake,
            params.get(Param::DispensationPct),
        )?;
        let listing = self.listing_mut(hash)?;
        listing.challenge_id = Some(poll_id);
        listing.unstaked_deposit -= stake;

        info!(listing = %hash, poll_id, %challenger, stake, "challenge initiated");
        self.pending_events.push(TcrEvent::ChallengeInitiated {
            listing: hash,
            challenge_id: poll_id,
            challenger: challenger.clone(),
            commit_end,
            reveal_end,
            data: data.to_string(),
        });
        Ok(Some(poll_id))
    }

    /// Advance a listing: whitelist it, or settle its ended challenge.
    pub fn update_status(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        hash: ListingHash,
        now: Timestamp,
    ) -> Result<StatusUpdate, RegistryError> {
        let whitelisted = self.require(hash)?.whitelisted;
        if self.can_be_whitelisted(hash, now) {
            self.whitelist(hash)?;
            return Ok(StatusUpdate::Whitelisted);
        }
        if self.challenge_can_be_resolved(hash, resolver, now)? {
            return self.resolve_challenge(ledger, resolver, hash, now);
        }
        if self.challenge_exists(hash) {
            return Err(RegistryError::ChallengeUnresolved(hash));
        }
        if whitelisted {
            return Ok(StatusUpdate::Unchanged);
        }
        Err(RegistryError::ApplicationPeriodActive(hash))
    }

    /// Update several listings; either all succeed or nothing changes.
    pub fn update_statuses(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        hashes: &[ListingHash],
        now: Timestamp,
    ) -> Result<Vec<StatusUpdate>, RegistryError> {
        self.atomically(ledger, |registry, staged| {
            hashes
                .iter()
                .map(|hash| registry.update_status(staged, resolver, *hash, now))
                .collect()
        })
    }

    fn whitelist(&mut self, hash: ListingHash) -> Result<(), RegistryError> {
        let listing = self.listing_mut(hash)?;
        if listing.whitelisted {
            return Ok(());
        }
        listing.whitelisted = true;
        info!(listing = %hash, "application whitelisted");
        self.pending_events
            .push(TcrEvent::ApplicationWhitelisted { listing: hash });
        Ok(())
    }

    fn resolve_challenge(
        &mut self,
        ledger: &mut dyn TokenLedger,
        resolver: &dyn ChallengeResolver,
        hash: ListingHash,
        now: Timestamp,
    ) -> Result<StatusUpdate, RegistryError> {
        let challenge_id = self
            .require(hash)?
            .challenge_id
            .ok_or(RegistryError::ChallengeUnresolved(hash))?;
        let resolution = self.challenges.resolve(challenge_id, resolver, now)?;

        if resolution.passed {
            let listing = self.listing_mut(hash)?;
            listing.unstaked_deposit = listing
                .unstaked_deposit
                .checked_add(resolution.winner_reward)
                .ok_or(RegistryError::Overflow)?;
            let whitelisted = listing.application_ended(now);
            if whitelisted {
                self.whitelist(hash)?;
            }
            self.pending_events.push(TcrEvent::ChallengeFailed {
                subject: SubjectKind::Listing,
                challenge_id,
                reward_pool: resolution.reward_pool,
                total_tokens: resolution.total_tokens,
            });
            info!(listing = %hash, challenge_id, reward = resolution.winner_reward, "challenge failed, listing kept");
            Ok(StatusUpdate::ChallengeFailed { whitelisted })
        } else {
            let removed = self.reset_listing(ledger, hash)?;
            ledger.transfer(&self.escrow, &resolution.challenger, resolution.winner_reward)?;
            self.pending_events.push(TcrEvent::ChallengeSucceeded {
                subject: SubjectKind::Listing,
                challenge_id,
                reward_pool: resolution.reward_pool,
                total_tokens: resolution.total_tokens,
            });
            self.pending_events.push(if removed.whitelisted {
                TcrEvent::ListingRemoved { listing: hash }
            } else {
                TcrEvent::ApplicationRemoved { listing: hash }
            });
            info!(listing = %hash, challenge_id, reward = resolution.winner_reward, "challenge succeeded, listing removed");
            Ok(StatusUpdate::ChallengeSucceeded)
        }
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
    ) -> Result<u128, RegistryError> {
        let reward = self
            .challenges
            .claim_reward(voter, challenge_id, salt, resolver, now)?;
        ledger.transfer(&self.escrow, voter, reward)?;
        debug!(challenge_id, %voter, reward, "listing challenge reward paid");
        self.pending_events.push(TcrEvent::RewardClaimed {
            subject: SubjectKind::Listing,
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
    ) -> Result<u128, RegistryError> {
        self.atomically(ledger, |registry, staged| {
            claims.iter().try_fold(0u128, |total, (challenge_id, salt)| {
                let reward =
                    registry.claim_reward(staged, resolver, voter, *challenge_id, *salt, now)?;
                total.checked_add(reward).ok_or(RegistryError::Overflow)
            })
        })
    }

    pub fn voter_reward(
        &self,
        resolver: &dyn ChallengeResolver,
        voter: &Address,
        challenge_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, RegistryError> {
        Ok(self
            .challenges
            .voter_reward(voter, challenge_id, salt, resolver, now)?)
    }

    pub fn token_claims(&self, challenge_id: PollId, voter: &Address) -> bool {
        self.challenges.token_claims(challenge_id, voter)
    }

    // ── Views ─────────────────────────────────────────────────────────────

    pub fn listing(&self, hash: ListingHash) -> Option<&Listing> {
        self.listings.get(&hash)
    }

    pub fn listings(&self) -> impl Iterator<Item = (&ListingHash, &Listing)> {
        self.listings.iter()
    }

    /// The challenge record behind `challenge_id`, kept after resolution for claims.
    pub fn challenge_record(&self, challenge_id: PollId) -> Option<&Challenge> {
        self.challenges.get(challenge_id)
    }

    pub fn is_whitelisted(&self, hash: ListingHash) -> bool {
        self.listing(hash).is_some_and(|l| l.whitelisted)
    }

    pub fn app_was_made(&self, hash: ListingHash) -> bool {
        self.listings.contains_key(&hash)
    }

    /// The listing has a challenge that is not yet resolved.
    pub fn challenge_exists(&self, hash: ListingHash) -> bool {
        self.listing(hash)
            .and_then(|l| l.challenge_id)
            .is_some_and(|id| self.challenges.is_open(id))
    }

    pub fn can_be_whitelisted(&self, hash: ListingHash, now: Timestamp) -> bool {
        self.listing(hash).is_some_and(|l| {
            l.application_ended(now) && !l.whitelisted && !self.challenge_exists(hash)
        })
    }

    pub fn challenge_can_be_resolved(
        &self,
        hash: ListingHash,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<bool, RegistryError> {
        match self.listing(hash).and_then(|l| l.challenge_id) {
            Some(id) => Ok(self.challenges.can_be_resolved(id, resolver, now)?),
            None => Ok(false),
        }
    }

    /// What the winner of an ended, unresolved challenge would receive.
    pub fn determine_reward(
        &self,
        challenge_id: PollId,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<u128, RegistryError> {
        Ok(self
            .challenges
            .determine_reward(challenge_id, resolver, now)?)
    }

    pub fn phase(
        &self,
        hash: ListingHash,
        resolver: &dyn ChallengeResolver,
        now: Timestamp,
    ) -> Result<ListingPhase, RegistryError> {
        let open = self.challenge_exists(hash);
        let ended = open && self.challenge_can_be_resolved(hash, resolver, now)?;
        Ok(ListingPhase::derive(self.listing(hash), now, open, ended))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn atomically<T>(
        &mut self,
        ledger: &mut dyn TokenLedger,
        op: impl FnOnce(&mut Self, &mut dyn TokenLedger) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
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
