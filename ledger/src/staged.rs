//! Write-ahead staging over an authoritative ledger.
//!
//! A [`StagedLedger`] reads through to the real ledger, keeps every change in an
//! overlay, and records each accepted call in a [`Journal`]. Dropping it discards the
//! staged changes; [`Journal::apply`] replays them onto the real ledger.

use crate::error::LedgerError;
use crate::ledger::TokenLedger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tcr_types::Address;
use tracing::{debug, error, warn};

/// One accepted ledger call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    TransferFrom {
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    },
    Approve {
        owner: Address,
        spender: Address,
        amount: u128,
    },
}

/// The ordered list of calls a staged operation made.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    ops: Vec<LedgerOp>,
}

impl Journal {
    pub fn ops(&self) -> &[LedgerOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Total amount moved by transfers in this journal.
    pub fn volume(&self) -> u128 {
        self.ops
            .iter()
            .map(|op| match op {
                LedgerOp::Transfer { amount, .. } | LedgerOp::TransferFrom { amount, .. } => {
                    *amount
                }
                LedgerOp::Approve { .. } => 0,
            })
            .fold(0u128, u128::saturating_add)
    }

    /// Replay the journal onto the authoritative ledger.
    ///
    /// Entries were validated against the staged view, so a conforming ledger accepts
    /// them all. If the ledger rejects one anyway, the entries already applied are
    /// compensated in reverse order and the failure is returned. When compensation
    /// is itself rejected the result is [`LedgerError::CompensationFailed`].
    pub fn apply<L: TokenLedger + ?Sized>(self, ledger: &mut L) -> Result<(), LedgerError> {
        let mut undo: Vec<Vec<LedgerOp>> = Vec::with_capacity(self.ops.len());
        for (index, op) in self.ops.into_iter().enumerate() {
            let inverse = inverse_of(&op, ledger);
            if let Err(source) = apply_op(&op, ledger) {
                warn!(index, error = %source, "ledger rejected staged entry, compensating");
                let mut failures = Vec::new();
                for ops in undo.into_iter().rev() {
                    for inv in ops {
                        if let Err(e) = apply_op(&inv, ledger) {
                            error!(error = %e, ?inv, "compensating entry failed");
                            failures.push(e);
                        }
                    }
                }
                let source = Box::new(source);
                let failed = failures.len();
                return Err(match failures.into_iter().next() {
                    None => LedgerError::ApplyFailed { index, source },
                    Some(first) => LedgerError::CompensationFailed {
                        index,
                        source,
                        failed,
                        first: Box::new(first),
                    },
                });
            }
            undo.push(inverse);
        }
        Ok(())
    }
}

fn apply_op<L: TokenLedger + ?Sized>(op: &LedgerOp, ledger: &mut L) -> Result<(), LedgerError> {
    match op {
        LedgerOp::Transfer { from, to, amount } => ledger.transfer(from, to, *amount),
        LedgerOp::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => ledger.transfer_from(spender, from, to, *amount),
        LedgerOp::Approve {
            owner,
            spender,
            amount,
        } => ledger.approve(owner, spender, *amount),
    }
}

/// Entries that undo `op`, computed from the ledger state before `op` applies.
fn inverse_of<L: TokenLedger + ?Sized>(op: &LedgerOp, ledger: &L) -> Vec<LedgerOp> {
    match op {
        LedgerOp::Transfer { from, to, amount } => vec![LedgerOp::Transfer {
            from: to.clone(),
            to: from.clone(),
            amount: *amount,
        }],
        LedgerOp::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => vec![
            LedgerOp::Transfer {
                from: to.clone(),
                to: from.clone(),
                amount: *amount,
            },
            LedgerOp::Approve {
                owner: from.clone(),
                spender: spender.clone(),
                amount: ledger.allowance(from, spender),
            },
        ],
        LedgerOp::Approve { owner, spender, .. } => vec![LedgerOp::Approve {
            owner: owner.clone(),
            spender: spender.clone(),
            amount: ledger.allowance(owner, spender),
        }],
    }
}

/// A staged view over `base`.
pub struct StagedLedger<'a, L: TokenLedger + ?Sized> {
    base: &'a L,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    journal: Journal,
}

impl<'a, L: TokenLedger + ?Sized> StagedLedger<'a, L> {
    pub fn new(base: &'a L) -> Self {
        Self {
            base,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            journal: Journal::default(),
        }
    }

    /// Finish staging and hand back the calls to replay.
    pub fn into_journal(self) -> Journal {
        self.journal
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    fn debit(&mut self, owner: &Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance_of(owner);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                owner: owner.clone(),
                needed: amount,
                available,
            })?;
        self.balances.insert(owner.clone(), remaining);
        Ok(())
    }

    fn credit(&mut self, owner: &Address, amount: u128) -> Result<(), LedgerError> {
        let updated = self
            .balance_of(owner)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(owner.clone()))?;
        self.balances.insert(owner.clone(), updated);
        Ok(())
    }

    /// Debit then credit; on a failed credit the debit is restored.
    fn move_tokens(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        let from_before = self.balance_of(from);
        self.debit(from, amount)?;
        if let Err(e) = self.credit(to, amount) {
            self.balances.insert(from.clone(), from_before);
            return Err(e);
        }
        Ok(())
    }
}

impl<L: TokenLedger + ?Sized> TokenLedger for StagedLedger<'_, L> {
    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances
            .get(owner)
            .copied()
            .unwrap_or_else(|| self.base.balance_of(owner))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_else(|| self.base.allowance(owner, spender))
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.move_tokens(from, to, amount)?;
        debug!(%from, %to, amount, "staged transfer");
        self.journal.ops.push(LedgerOp::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
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
        debug!(%spender, %from, %to, amount, "staged transfer_from");
        self.journal.ops.push(LedgerOp::TransferFrom {
            spender: spender.clone(),
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        Ok(())
    }

    fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
        self.journal.ops.push(LedgerOp::Approve {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal map-backed ledger; the full test double lives in `tcr-nullables`.
    #[derive(Default)]
    struct MapLedger {
        balances: HashMap<Address, u128>,
        allowances: HashMap<(Address, Address), u128>,
        reject_to: Vec<Address>,
    }

    impl TokenLedger for MapLedger {
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
            if self.reject_to.contains(to) {
                return Err(LedgerError::Rejected(format!("frozen {to}")));
            }
            let available = self.balance_of(from);
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    owner: from.clone(),
                    needed: amount,
                    available,
                });
            }
            *self.balances.entry(from.clone()).or_default() -= amount;
            *self.balances.entry(to.clone()).or_default() += amount;
            Ok(())
        }

        fn transfer_from(
            &mut self,
            spender: &Address,
            from: &Address,
            to: &Address,
            amount: u128,
        ) -> Result<(), LedgerError> {
            let allowed = self.allowance(from, spender);
            if allowed < amount {
                return Err(LedgerError::InsufficientAllowance {
                    owner: from.clone(),
                    spender: spender.clone(),
                    needed: amount,
                    available: allowed,
                });
            }
            self.transfer(from, to, amount)?;
            self.allowances
                .insert((from.clone(), spender.clone()), allowed - amount);
            Ok(())
        }

        fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<(), LedgerError> {
            self.allowances.insert((owner.clone(), spender.clone()), amount);
            Ok(())
        }
    }

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn funded() -> MapLedger {
        let mut ledger = MapLedger::default();
        ledger.balances.insert(addr("alice"), 100);
        ledger.allowances.insert((addr("alice"), addr("registry")), 60);
        ledger
    }

    #[test]
    fn staged_changes_are_invisible_until_applied() {
        let mut ledger = funded();
        let journal = {
            let mut staged = StagedLedger::new(&ledger);
            staged
                .transfer_from(&addr("registry"), &addr("alice"), &addr("registry"), 50)
                .unwrap();
            assert_eq!(staged.balance_of(&addr("alice")), 50);
            assert_eq!(staged.balance_of(&addr("registry")), 50);
            assert_eq!(staged.allowance(&addr("alice"), &addr("registry")), 10);
            staged.into_journal()
        };
        assert_eq!(ledger.balance_of(&addr("alice")), 100);
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.volume(), 50);

        journal.apply(&mut ledger).unwrap();
        assert_eq!(ledger.balance_of(&addr("alice")), 50);
        assert_eq!(ledger.balance_of(&addr("registry")), 50);
        assert_eq!(ledger.allowance(&addr("alice"), &addr("registry")), 10);
    }

    #[test]
    fn staged_validation_uses_overlay() {
        let ledger = funded();
        let mut staged = StagedLedger::new(&ledger);
        staged.transfer(&addr("alice"), &addr("bob"), 80).unwrap();
        let err = staged.transfer(&addr("alice"), &addr("bob"), 30).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { needed: 30, available: 20, .. }
        ));
        // The rejected call is not journaled.
        assert_eq!(staged.journal().len(), 1);
    }

    #[test]
    fn allowance_is_enforced() {
        let ledger = funded();
        let mut staged = StagedLedger::new(&ledger);
        let err = staged
            .transfer_from(&addr("registry"), &addr("alice"), &addr("registry"), 61)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAllowance { .. }));
        assert!(staged.journal().is_empty());
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let ledger = funded();
        let mut staged = StagedLedger::new(&ledger);
        staged.transfer(&addr("alice"), &addr("alice"), 40).unwrap();
        assert_eq!(staged.balance_of(&addr("alice")), 100);
    }

    #[test]
    fn failed_apply_is_compensated() {
        let mut ledger = funded();
        let journal = {
            let mut staged = StagedLedger::new(&ledger);
            staged
                .transfer_from(&addr("registry"), &addr("alice"), &addr("registry"), 50)
                .unwrap();
            staged.transfer(&addr("registry"), &addr("carol"), 20).unwrap();
            staged.into_journal()
        };
        ledger.reject_to = vec![addr("carol")];

        let err = journal.apply(&mut ledger).unwrap_err();
        assert!(matches!(err, LedgerError::ApplyFailed { index: 1, .. }));
        assert_eq!(ledger.balance_of(&addr("alice")), 100);
        assert_eq!(ledger.balance_of(&addr("registry")), 0);
        assert_eq!(ledger.allowance(&addr("alice"), &addr("registry")), 60);
    }

    #[test]
    fn rejected_compensation_is_reported() {
        let mut ledger = funded();
        let journal = {
            let mut staged = StagedLedger::new(&ledger);
            staged
                .transfer_from(&addr("registry"), &addr("alice"), &addr("registry"), 50)
                .unwrap();
            staged.transfer(&addr("registry"), &addr("carol"), 20).unwrap();
            staged.into_journal()
        };
        ledger.reject_to = vec![addr("carol"), addr("alice")];

        let err = journal.apply(&mut ledger).unwrap_err();
        match err {
            LedgerError::CompensationFailed {
                index,
                source,
                failed,
                first,
            } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, LedgerError::Rejected(_)));
                assert_eq!(failed, 1);
                assert!(matches!(*first, LedgerError::Rejected(_)));
            }
            other => panic!("expected CompensationFailed, got {other:?}"),
        }
        // The refund to alice was refused; the allowance reset still went through.
        assert_eq!(ledger.balance_of(&addr("alice")), 50);
        assert_eq!(ledger.balance_of(&addr("registry")), 50);
        assert_eq!(ledger.allowance(&addr("alice"), &addr("registry")), 60);
    }
}
