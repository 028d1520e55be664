//! The external token ledger surface.

use crate::error::LedgerError;
use tcr_types::Address;

/// An atomic, authoritative balance ledger.
///
/// Every mutating call either applies completely or returns an error without side
/// effects. `transfer_from` spends the allowance `owner` granted to `spender` and
/// always decrements it by the amount moved.
pub trait TokenLedger {
    fn balance_of(&self, owner: &Address) -> u128;

    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` from `from` to `to`, authorised by `from`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128)
        -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`, authorised by `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    /// Set the allowance `owner` grants to `spender`.
    fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;
}
