//! Blake2b hashing for commitments and identifiers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use tcr_types::{ListingHash, Param, ProposalId, Salt, SecretHash, VoteOption};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// The commitment a voter submits during the commit window: `H(option, salt)`.
pub fn vote_commitment(option: VoteOption, salt: Salt) -> SecretHash {
    SecretHash::new(blake2b_256_multi(&[&[option.as_u8()], &salt.to_be_bytes()]))
}

/// Content hash naming a listing, e.g. `listing_hash(b"example.com")`.
pub fn listing_hash(data: &[u8]) -> ListingHash {
    ListingHash::new(blake2b_256(data))
}

/// Identifier of a reparameterization proposal.
///
/// The nonce makes a re-proposal of the same `(name, value)` after the first one was
/// processed land on a fresh id.
pub fn proposal_id(name: Param, value: u128, nonce: u64) -> ProposalId {
    ProposalId::new(blake2b_256_multi(&[
        name.name().as_bytes(),
        &value.to_be_bytes(),
        &nonce.to_be_bytes(),
    ]))
}
