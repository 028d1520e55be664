//! Errors raised while parsing or validating shared types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("unknown parameter name: {0}")]
    UnknownParam(String),

    #[error("parameter {name} must be at most {max}, got {value}")]
    ParamOutOfRange { name: &'static str, value: u128, max: u128 },

    #[error("parameter {0} must be non-zero")]
    ParamZero(&'static str),

    #[error("invalid vote option {0}: expected 0 (against) or 1 (for)")]
    InvalidVoteOption(u8),
}
