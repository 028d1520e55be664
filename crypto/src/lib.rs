//! Hashing primitives for the token-curated registry.
//!
//! - **Blake2b-256** for vote commitments, listing hashes and proposal ids
//! - Random salt generation for voters preparing a commitment

pub mod hash;
pub mod salt;

pub use hash::{blake2b_256, blake2b_256_multi, listing_hash, proposal_id, vote_commitment};
pub use salt::generate_salt;
