//! Poll pass predicates.

use serde::{Deserialize, Serialize};

/// How a poll's revealed tallies decide it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// `100 * for > quorum * (for + against)`.
    RevealedShare,
    /// The revealed share must clear the quorum and `for` must beat `against`.
    #[default]
    RevealedShareWithMajority,
}

impl QuorumRule {
    /// Whether the subject of a poll is upheld. `vote_quorum` is a percentage.
    ///
    /// Evaluated as `for * (100 - quorum) > against * quorum`, which is the share
    /// test without the intermediate sum. Products are compared at 256 bits.
    pub fn passes(self, vote_quorum: u128, votes_for: u128, votes_against: u128) -> bool {
        let quorum = vote_quorum.min(100);
        let share = widening_mul(votes_for, 100 - quorum) > widening_mul(votes_against, quorum);
        match self {
            Self::RevealedShare => share,
            Self::RevealedShareWithMajority => share && votes_for > votes_against,
        }
    }
}

/// Full product of `a * b` as `(high, low)` words, ordered like the 256-bit value.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let low = (ll & MASK) | (mid << 64);
    let high = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (high, low)
}
