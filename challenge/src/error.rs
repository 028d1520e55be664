use crate::resolver::ResolverError;
use tcr_types::{Address, PollId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("challenge {0} does not exist")]
    NotFound(PollId),

    #[error("challenge {0} already exists")]
    AlreadyExists(PollId),

    #[error("challenge {0} is already resolved")]
    AlreadyResolved(PollId),

    #[error("challenge {0} is not resolved yet")]
    NotResolved(PollId),

    #[error("the poll for challenge {0} has not ended")]
    PollNotEnded(PollId),

    #[error("{voter} already claimed the reward for challenge {challenge_id}")]
    AlreadyClaimed { challenge_id: PollId, voter: Address },

    #[error("dispensation percentage {0} exceeds 100")]
    InvalidDispensation(u128),

    #[error("reward of {requested} exceeds the {remaining} left in the pool of challenge {challenge_id}")]
    PoolExhausted {
        challenge_id: PollId,
        requested: u128,
        remaining: u128,
    },

    #[error("arithmetic overflow in reward computation")]
    Overflow,

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}
