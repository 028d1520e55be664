use tcr_ledger::LedgerError;
use tcr_types::{Address, PollId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("poll {0} does not exist")]
    PollNotFound(PollId),

    #[error("commit period of poll {0} is not active")]
    CommitPeriodInactive(PollId),

    #[error("reveal period of poll {0} is not active")]
    RevealPeriodInactive(PollId),

    #[error("poll {0} has not ended")]
    PollNotEnded(PollId),

    #[error("{voter} already committed to poll {poll_id}")]
    AlreadyCommitted { voter: Address, poll_id: PollId },

    #[error("{voter} has no commitment in poll {poll_id}")]
    NotCommitted { voter: Address, poll_id: PollId },

    #[error("{voter} already revealed in poll {poll_id}")]
    AlreadyRevealed { voter: Address, poll_id: PollId },

    #[error("{voter} did not reveal in poll {poll_id}")]
    NotRevealed { voter: Address, poll_id: PollId },

    #[error("revealed option and salt do not match the commitment of {voter} in poll {poll_id}")]
    HashMismatch { voter: Address, poll_id: PollId },

    #[error("{voter} did not vote for the winning side of poll {poll_id}")]
    LosingSide { voter: Address, poll_id: PollId },

    #[error("commitment hash must be non-zero")]
    ZeroSecretHash,

    #[error("token amount must be non-zero")]
    ZeroTokens,

    #[error("insertion hint {prev:?} is not a valid position for {tokens} tokens in poll {poll_id}")]
    InvalidInsertPosition {
        poll_id: PollId,
        prev: Option<PollId>,
        tokens: u128,
    },

    #[error("{voter} requested {requested} voting rights but only {available} are unlocked")]
    InsufficientVotingRights {
        voter: Address,
        requested: u128,
        available: u128,
    },

    #[error("{voter} has no locked, unrevealed commitment in poll {poll_id}")]
    NothingToRescue { voter: Address, poll_id: PollId },

    #[error("vote quorum {0} exceeds 100")]
    InvalidQuorum(u128),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
