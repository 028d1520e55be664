//! The capability a challenge needs from whatever adjudicates it.

use tcr_types::{Address, PollId, Salt, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("poll {0} does not exist")]
    UnknownPoll(PollId),

    #[error("poll {0} has not ended")]
    PollActive(PollId),

    #[error("{voter} is not eligible in poll {poll_id}: {reason}")]
    NotEligible {
        voter: Address,
        poll_id: PollId,
        reason: String,
    },

    #[error("invalid poll parameters: {0}")]
    InvalidPoll(String),

    #[error("resolver failure: {0}")]
    Other(String),
}

/// Adjudicates challenges.
///
/// The commit-reveal voting engine is the standard implementation; any other
/// mechanism that can open a poll and later report its outcome can stand in.
pub trait ChallengeResolver {
    /// Open a poll and return its id. Durations are in seconds.
    fn start_poll(
        &mut self,
        vote_quorum: u128,
        commit_duration: u128,
        reveal_duration: u128,
        now: Timestamp,
    ) -> Result<PollId, ResolverError>;

    fn poll_ended(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError>;

    /// Whether the subject of the poll is upheld. Only meaningful once ended.
    fn is_passed(&self, poll_id: PollId, now: Timestamp) -> Result<bool, ResolverError>;

    /// Tokens revealed for the winning side.
    fn total_winning_tokens(&self, poll_id: PollId, now: Timestamp)
        -> Result<u128, ResolverError>;

    /// Tokens `voter` revealed for the winning side, proven by `salt`.
    fn num_passing_tokens(
        &self,
        voter: &Address,
        poll_id: PollId,
        salt: Salt,
        now: Timestamp,
    ) -> Result<u128, ResolverError>;
}
