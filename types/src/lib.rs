//! Fundamental types for the token-curated registry.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, content hashes, timestamps, governable parameters, vote options and the
//! structured events every state machine emits.

pub mod address;
pub mod error;
pub mod event;
pub mod hash;
pub mod params;
pub mod time;
pub mod vote;

pub use address::Address;
pub use error::TypesError;
pub use event::{SubjectKind, TcrEvent};
pub use hash::{ListingHash, ProposalId, SecretHash};
pub use params::{Param, ParamDefaults};
pub use time::Timestamp;
pub use vote::{PollId, Salt, VoteOption};
