//! Salt generation for vote commitments.

use tcr_types::Salt;

/// Draw a fresh random salt.
///
/// Voters must keep the salt until the reveal window; losing it forfeits the vote.
pub fn generate_salt() -> Salt {
    rand::random::<Salt>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::vote_commitment;
    use tcr_types::VoteOption;

    #[test]
    fn fresh_salts_hide_identical_votes() {
        let a = generate_salt();
        let b = generate_salt();
        assert_ne!(a, b);
        assert_ne!(
            vote_commitment(VoteOption::For, a),
            vote_commitment(VoteOption::For, b)
        );
        assert_eq!(
            vote_commitment(VoteOption::For, a),
            vote_commitment(VoteOption::For, a)
        );
    }
}
