use tcr_challenge::{ChallengeError, ResolverError};
use tcr_ledger::LedgerError;
use tcr_types::{Address, ListingHash, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("listing {0} not found")]
    ListingNotFound(ListingHash),

    #[error("listing {0} is already applied for or whitelisted")]
    ListingExists(ListingHash),

    #[error("{caller} does not own listing {listing}")]
    NotOwner { listing: ListingHash, caller: Address },

    #[error("deposit {amount} is below the minimum of {min}")]
    DepositBelowMinimum { amount: u128, min: u128 },

    #[error("cannot withdraw {requested}: only {available} is unstaked")]
    InsufficientDeposit { requested: u128, available: u128 },

    #[error("withdrawal would leave {remaining}, below the minimum of {min}")]
    WithdrawBelowMinimum { remaining: u128, min: u128 },

    #[error("listing {0} is not whitelisted")]
    NotWhitelisted(ListingHash),

    #[error("listing {0} has an unresolved challenge")]
    ChallengeOpen(ListingHash),

    #[error("exit for listing {listing} already initiated, window closes at {closes}")]
    ExitAlreadyInitiated { listing: ListingHash, closes: Timestamp },

    #[error("no exit initiated for listing {0}")]
    ExitNotInitiated(ListingHash),

    #[error("exit window for listing {listing} is {opens}..={closes}")]
    ExitWindowClosed {
        listing: ListingHash,
        opens: Timestamp,
        closes: Timestamp,
    },

    #[error("application period of listing {0} is still running")]
    ApplicationPeriodActive(ListingHash),

    #[error("challenge against listing {0} cannot be resolved yet")]
    ChallengeUnresolved(ListingHash),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("challenge error: {0}")]
    Challenge(#[from] ChallengeError),

    #[error("resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
