//! Poll identifiers and ballot options.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};

/// Identifier of a poll. Challenge ids are the ids of the polls that adjudicate them.
///
/// Poll ids start at 1; there is no poll 0.
pub type PollId = u64;

/// Secret salt mixed into a vote commitment.
pub type Salt = u64;

/// The side a voter reveals.
///
/// `For` supports the subject of the poll (the listing stays, the proposal is
/// applied); `Against` sides with the challenger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    Against,
    For,
}

impl VoteOption {
    /// Wire value hashed into the commitment.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Against => 0,
            Self::For => 1,
        }
    }
}

impl TryFrom<u8> for VoteOption {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Against),
            1 => Ok(Self::For),
            other => Err(TypesError::InvalidVoteOption(other)),
        }
    }
}

impl From<bool> for VoteOption {
    fn from(passed: bool) -> Self {
        if passed {
            Self::For
        } else {
            Self::Against
        }
    }
}
