use tcr_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("insufficient balance for {owner}: need {needed}, have {available}")]
    InsufficientBalance {
        owner: Address,
        needed: u128,
        available: u128,
    },

    #[error("insufficient allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        needed: u128,
        available: u128,
    },

    #[error("arithmetic overflow crediting {0}")]
    Overflow(Address),

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("transfer rejected by ledger: {0}")]
    Rejected(String),

    #[error("journal entry {index} failed to apply: {source}")]
    ApplyFailed {
        index: usize,
        #[source]
        source: Box<LedgerError>,
    },

    /// The ledger rejected an entry and undoing the earlier entries also failed;
    /// the authoritative ledger holds a partial application.
    #[error("journal entry {index} failed to apply ({source}) and {failed} compensating entries were rejected, first: {first}")]
    CompensationFailed {
        index: usize,
        #[source]
        source: Box<LedgerError>,
        failed: usize,
        first: Box<LedgerError>,
    },
}
