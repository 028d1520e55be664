//! Nullable token ledger — an in-memory balance sheet with fault injection.

use std::collections::{BTreeMap, BTreeSet};
use tcr_ledger::{LedgerError, TokenLedger};
use tcr_types::Address;

/// An in-memory token ledger for testing.
///
/// Tokens enter through [`NullLedger::mint`]; every other movement goes through the
/// [`TokenLedger`] surface. Frozen addresses reject any transfer that touches them,
/// which lets tests force a failure after the core has already staged an operation.
#[derive(Clone, Debug, Default)]
pub struct NullLedger {
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<(Address, Address), u128>,
    frozen: BTreeSet<Address>,
    supply: u128,
    transfers: usize,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` new tokens to `to`.
    pub fn mint(&mut self, to: &Address, amount: u128) {
        *self.balances.entry(to.clone()).or_default() += amount;
        self.supply += amount;
    }

    /// Builder-style mint for test setup.
    pub fn with_balance(mut self, to: &str, amount: u128) -> Self {
        self.mint(&Address::new(to), amount);
        self
    }

    pub fn freeze(&mut self, address: &Address) {
        self.frozen.insert(address.clone());
    }

    pub fn unfreeze(&mut self, address: &Address) {
        self.frozen.remove(address);
    }

    pub fn total_supply(&self) -> u128 {
        self.supply
    }

    /// Sum of all balances; equals `total_supply` unless something leaked.
    pub fn circulating(&self) -> u128 {
        self.balances.values().sum()
    }

    /// Number of successful transfers so far.
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }

    fn check_frozen(&self, addresses: &[&Address]) -> Result<(), LedgerError> {
        match addresses.iter().find(|a| self.frozen.contains(**a)) {
            Some(address) => Err(LedgerError::Rejected(format!("{address} is frozen"))),
            None => Ok(()),
        }
    }

    fn move_tokens(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        if !from.is_valid() {
            return Err(LedgerError::InvalidAddress(from.to_string()));
        }
        if !to.is_valid() {
            return Err(LedgerError::InvalidAddress(to.to_string()));
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: from.clone(),
                needed: amount,
                available,
            });
        }
        if from != to {
            let credited = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Overflow(to.clone()))?;
            self.balances.insert(from.clone(), available - amount);
            self.balances.insert(to.clone(), credited);
        }
        self.transfers += 1;
        Ok(())
    }
}

impl TokenLedger for NullLedger {
    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.check_frozen(&[from, to])?;
        self.move_tokens(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.check_frozen(&[spender, from, to])?;
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowed,
            });
        }
        self.move_tokens(from, to, amount)?;
        self.allowances
            .insert((from.clone(), spender.clone()), allowed - amount);
        Ok(())
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<(), LedgerError> {
        self.check_frozen(&[owner])?;
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }
}
