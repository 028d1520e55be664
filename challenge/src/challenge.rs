//! A single challenge and its reward arithmetic.

use crate::error::ChallengeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tcr_types::Address;

/// A stake-backed dispute over a listing or a proposal.
///
/// The challenger and the subject's owner each put up `stake`. Whoever wins takes
/// both stakes minus `reward_pool`, which is shared among the voters who revealed
/// for the winning side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub challenger: Address,
    /// Fixed when the challenge is opened; zeroed at resolution if nobody won.
    pub reward_pool: u128,
    pub stake: u128,
    pub resolved: bool,
    /// Winning-side tokens, written once at resolution.
    pub total_tokens: u128,
    pub claims: BTreeSet<Address>,
    /// Sum of voter rewards paid so far.
    pub paid_out: u128,
}

impl Challenge {
    /// `reward_pool = (100 - dispensation_pct) * stake / 100`.
    pub fn new(
        challenger: Address,
        stake: u128,
        dispensation_pct: u128,
    ) -> Result<Self, ChallengeError> {
        let kept_pct = 100u128
            .checked_sub(dispensation_pct)
            .ok_or(ChallengeError::InvalidDispensation(dispensation_pct))?;
        let reward_pool = kept_pct
            .checked_mul(stake)
            .ok_or(ChallengeError::Overflow)?
            / 100;
        Ok(Self {
            challenger,
            reward_pool,
            stake,
            resolved: false,
            total_tokens: 0,
            claims: BTreeSet::new(),
            paid_out: 0,
        })
    }

    /// What the winner receives given the winning side's token total.
    ///
    /// With nobody on the winning side there is no one to share the pool with, so
    /// the winner takes both stakes in full.
    pub fn winner_reward(&self, winning_tokens: u128) -> Result<u128, ChallengeError> {
        let both = self.stake.checked_mul(2).ok_or(ChallengeError::Overflow)?;
        if winning_tokens == 0 {
            return Ok(both);
        }
        both.checked_sub(self.reward_pool)
            .ok_or(ChallengeError::Overflow)
    }

    /// A voter's share of the pool. Zero before resolution or with no winners.
    pub fn voter_reward(&self, voter_tokens: u128) -> Result<u128, ChallengeError> {
        if self.total_tokens == 0 {
            return Ok(0);
        }
        let scaled = voter_tokens
            .checked_mul(self.reward_pool)
            .ok_or(ChallengeError::Overflow)?;
        Ok(scaled / self.total_tokens)
    }

    pub fn remaining_pool(&self) -> u128 {
        self.reward_pool.saturating_sub(self.paid_out)
    }

    pub fn has_claimed(&self, voter: &Address) -> bool {
        self.claims.contains(voter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenger() -> Address {
        Address::new("challenger")
    }

    #[test]
    fn reward_pool_from_dispensation() {
        let c = Challenge::new(challenger(), 100, 50).unwrap();
        assert_eq!(c.reward_pool, 50);
        let c = Challenge::new(challenger(), 10, 0).unwrap();
        assert_eq!(c.reward_pool, 10);
        let c = Challenge::new(challenger(), 10, 100).unwrap();
        assert_eq!(c.reward_pool, 0);
        let c = Challenge::new(challenger(), 7, 50).unwrap();
        assert_eq!(c.reward_pool, 3);
    }

    #[test]
    fn dispensation_above_hundred_rejected() {
        assert!(matches!(
            Challenge::new(challenger(), 10, 101),
            Err(ChallengeError::InvalidDispensation(101))
        ));
    }

    #[test]
    fn winner_takes_everything_without_voters() {
        let c = Challenge::new(challenger(), 50, 50).unwrap();
        assert_eq!(c.winner_reward(0).unwrap(), 100);
        assert_eq!(c.winner_reward(1).unwrap(), 75);
    }

    #[test]
    fn voter_reward_is_proportional() {
        let mut c = Challenge::new(challenger(), 100, 50).unwrap();
        assert_eq!(c.voter_reward(10).unwrap(), 0);
        c.resolved = true;
        c.total_tokens = 30;
        assert_eq!(c.voter_reward(10).unwrap(), 16);
        assert_eq!(c.voter_reward(20).unwrap(), 33);
        assert_eq!(c.voter_reward(30).unwrap(), 50);
    }

    #[test]
    fn overflowing_stake_is_an_error() {
        assert!(matches!(
            Challenge::new(challenger(), u128::MAX, 0),
            Err(ChallengeError::Overflow)
        ));
    }
}
