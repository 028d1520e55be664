//! The token ledger as seen by the registry core.
//!
//! The fungible token is an external collaborator. The core never touches balances
//! except through the [`TokenLedger`] trait, and every top-level operation runs its
//! transfers against a [`StagedLedger`] first: transfers are validated against the
//! staged balances, recorded in a [`Journal`], and only applied to the authoritative
//! ledger once the whole operation has succeeded.

pub mod error;
pub mod ledger;
pub mod staged;

pub use error::LedgerError;
pub use ledger::TokenLedger;
pub use staged::{Journal, LedgerOp, StagedLedger};
