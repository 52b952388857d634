//! Authoritative store of account balances and symbol positions.
//!
//! Every mutation goes through one of the methods below; none of them can
//! ever leave a balance or position negative. Each account has its own
//! lock, so mutations against distinct accounts never contend with each
//! other — the per-symbol lock held by the matching engine during a fill
//! (see [`crate::engine`]) is what serializes the handful of single-account
//! mutations that make up one trade.

use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::error::{ExchangeError, Result};
use crate::types::{AccountId, Symbol};

struct AccountState {
    balance: Decimal,
    positions: HashMap<Symbol, Decimal>,
}

/// Read-only view of one account, suitable for a status reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub balance: Decimal,
    pub positions: HashMap<Symbol, Decimal>,
}

pub struct Ledger {
    accounts: DashMap<AccountId, Mutex<AccountState>>,
    symbols: DashSet<Symbol>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_capacity(256, 16)
    }

    pub fn with_capacity(account_capacity: usize, symbol_capacity: usize) -> Self {
        Self {
            accounts: DashMap::with_capacity(account_capacity),
            symbols: DashSet::with_capacity(symbol_capacity),
        }
    }

    /// Registers `id` with the given opening `balance`. Fails if `id` is
    /// already known.
    pub fn create_account(&self, id: AccountId, balance: Decimal) -> Result<()> {
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(ExchangeError::DuplicateAccount { account_id: id }),
            Entry::Vacant(v) => {
                v.insert(Mutex::new(AccountState {
                    balance,
                    positions: HashMap::new(),
                }));
                Ok(())
            }
        }
    }

    /// Registers `sym` (idempotent) and adds `num` shares to `id`'s
    /// position in it.
    pub fn create_or_add_shares(&self, sym: &Symbol, id: AccountId, num: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        self.symbols.insert(sym.clone());
        let mut state = entry.lock();
        *state.positions.entry(sym.clone()).or_insert(Decimal::ZERO) += num;
        Ok(())
    }

    /// Decreases `id`'s balance by `amount` iff sufficient.
    pub fn reserve_funds(&self, id: AccountId, amount: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        let mut state = entry.lock();
        if state.balance < amount {
            return Err(ExchangeError::InsufficientFunds {
                account_id: id,
                needed: amount,
                available: state.balance,
            });
        }
        state.balance -= amount;
        Ok(())
    }

    /// Increases `id`'s balance by `amount`. Used to give back funds that
    /// were reserved but not consumed by a trade (a cancellation, or a
    /// buyer's overpay refund).
    pub fn refund_funds(&self, id: AccountId, amount: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        entry.lock().balance += amount;
        Ok(())
    }

    /// Decreases `id`'s position in `sym` by `num` iff sufficient.
    pub fn reserve_shares(&self, id: AccountId, sym: &Symbol, num: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        let mut state = entry.lock();
        let available = state.positions.get(sym).copied().unwrap_or(Decimal::ZERO);
        if available < num {
            return Err(ExchangeError::InsufficientShares {
                account_id: id,
                sym: sym.clone(),
                needed: num,
                available,
            });
        }
        *state.positions.get_mut(sym).expect("checked above") -= num;
        Ok(())
    }

    /// Increases `id`'s position in `sym` by `num`, creating the position
    /// if absent. Used to credit a buyer's trade proceeds.
    pub fn credit_shares(&self, id: AccountId, sym: &Symbol, num: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        let mut state = entry.lock();
        *state.positions.entry(sym.clone()).or_insert(Decimal::ZERO) += num;
        Ok(())
    }

    /// Increases `id`'s balance by `amount`. Used to credit a seller's
    /// trade proceeds.
    pub fn credit_funds(&self, id: AccountId, amount: Decimal) -> Result<()> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        entry.lock().balance += amount;
        Ok(())
    }

    pub fn snapshot(&self, id: AccountId) -> Result<AccountSnapshot> {
        let entry = self
            .accounts
            .get(&id)
            .ok_or(ExchangeError::UnknownAccount { account_id: id })?;
        let state = entry.lock();
        Ok(AccountSnapshot {
            id,
            balance: state.balance,
            positions: state.positions.clone(),
        })
    }

    pub fn known_symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(|s| s.clone()).collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_account_rejects_duplicate() {
        let ledger = Ledger::new();
        ledger.create_account(1, dec!(100)).unwrap();
        let err = ledger.create_account(1, dec!(50)).unwrap_err();
        assert_eq!(err, ExchangeError::DuplicateAccount { account_id: 1 });
    }

    #[test]
    fn reserve_funds_respects_balance() {
        let ledger = Ledger::new();
        ledger.create_account(1, dec!(100)).unwrap();
        ledger.reserve_funds(1, dec!(60)).unwrap();
        let err = ledger.reserve_funds(1, dec!(60)).unwrap_err();
        assert!(matches!(err, ExchangeError::InsufficientFunds { .. }));
        assert_eq!(ledger.snapshot(1).unwrap().balance, dec!(40));
    }

    #[test]
    fn reserve_shares_respects_position() {
        let ledger = Ledger::new();
        let sym = "SPY".to_string();
        ledger.create_account(1, dec!(0)).unwrap();
        ledger.create_or_add_shares(&sym, 1, dec!(10)).unwrap();
        ledger.reserve_shares(1, &sym, dec!(4)).unwrap();
        let err = ledger.reserve_shares(1, &sym, dec!(7)).unwrap_err();
        assert!(matches!(err, ExchangeError::InsufficientShares { .. }));
    }

    #[test]
    fn unknown_account_is_reported_for_every_operation() {
        let ledger = Ledger::new();
        let sym = "SPY".to_string();
        assert!(matches!(
            ledger.reserve_funds(1, dec!(1)),
            Err(ExchangeError::UnknownAccount { account_id: 1 })
        ));
        assert!(matches!(
            ledger.reserve_shares(1, &sym, dec!(1)),
            Err(ExchangeError::UnknownAccount { account_id: 1 })
        ));
        assert!(matches!(
            ledger.create_or_add_shares(&sym, 1, dec!(1)),
            Err(ExchangeError::UnknownAccount { account_id: 1 })
        ));
    }

    #[test]
    fn credit_and_refund_never_fail_on_known_account() {
        let ledger = Ledger::new();
        ledger.create_account(1, dec!(0)).unwrap();
        ledger.credit_funds(1, dec!(10)).unwrap();
        ledger.refund_funds(1, dec!(5)).unwrap();
        assert_eq!(ledger.snapshot(1).unwrap().balance, dec!(15));
    }

    #[test]
    fn zero_position_remains_queryable_after_full_reservation() {
        let ledger = Ledger::new();
        let sym = "SPY".to_string();
        ledger.create_account(1, dec!(0)).unwrap();
        ledger.create_or_add_shares(&sym, 1, dec!(5)).unwrap();
        ledger.reserve_shares(1, &sym, dec!(5)).unwrap();
        assert_eq!(
            ledger.snapshot(1).unwrap().positions.get(&sym).copied(),
            Some(Decimal::ZERO)
        );
    }
}
