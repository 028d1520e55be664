//! The registry of curated listings.
//!
//! Anyone may apply to list something by staking at least `minDeposit`. Once the
//! application period passes unchallenged the listing is whitelisted. Any token holder
//! may challenge an application or a whitelisted listing by matching `minDeposit`;
//! a poll then decides whether the listing stays.

pub mod engine;
pub mod error;
pub mod listing;

pub use engine::Registry;
pub use error::RegistryError;
pub use listing::{Listing, ListingPhase, StatusUpdate};
