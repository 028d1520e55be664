//! Partial-lock commit-reveal (PLCR) voting.
//!
//! Voters escrow tokens for voting rights, commit a blinded ballot `H(option, salt)`
//! during a poll's commit window and reveal it during the reveal window. The same
//! voting rights may back ballots in several polls at once; what is locked is the
//! largest amount committed to any poll the voter has not yet revealed or rescued.

pub mod engine;
pub mod error;
pub mod locks;
pub mod poll;
pub mod quorum;

pub use engine::{CommitRequest, PlcrVoting, RevealRequest};
pub use error::VotingError;
pub use locks::LockIndex;
pub use poll::{Ballot, Poll, PollPhase};
pub use quorum::QuorumRule;
