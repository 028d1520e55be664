//! Challenges shared by the registry and the parameterizer.
//!
//! Listings and reparameterization proposals are contested the same way: a
//! challenger matches a stake, a poll decides the outcome, the winner takes the
//! stakes minus the voter reward pool, and voters on the winning side claim their
//! share of that pool. This crate holds that common machinery. The poll itself is
//! run by whatever implements [`ChallengeResolver`].

pub mod book;
pub mod challenge;
pub mod error;
pub mod resolver;

pub use book::{ChallengeBook, Resolution};
pub use challenge::Challenge;
pub use error::ChallengeError;
pub use resolver::{ChallengeResolver, ResolverError};
