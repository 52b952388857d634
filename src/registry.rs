//! Order identity assignment and the authoritative execution history of
//! every order ever accepted.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::error::{ExchangeError, Result};
use crate::types::{AccountId, OrderId, Price, Quantity, Side, Symbol};

/// The immutable facts captured when an order is accepted.
#[derive(Debug, Clone)]
pub struct OrderDescriptor {
    pub account_id: AccountId,
    pub sym: Symbol,
    pub side: Side,
    pub limit_price: Price,
    pub original_amount: Quantity,
    pub created_at: i64,
}

/// One executed trade against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRecord {
    pub shares: Quantity,
    pub price: Price,
    pub time: i64,
}

/// Recorded once an order's open remainder is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelRecord {
    pub shares_cancelled: Quantity,
    pub time: i64,
}

struct OrderRecord {
    descriptor: OrderDescriptor,
    open_shares: Quantity,
    fills: Vec<FillRecord>,
    cancel: Option<CancelRecord>,
}

/// Immutable view of an order sufficient to build a status reply.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub account_id: AccountId,
    pub sym: Symbol,
    pub side: Side,
    pub limit_price: Price,
    pub original_amount: Quantity,
    pub created_at: i64,
    pub open_shares: Quantity,
    pub fills: Vec<FillRecord>,
    pub cancel: Option<CancelRecord>,
}

impl OrderSnapshot {
    /// An order is open iff it has remaining quantity and has not been
    /// cancelled.
    pub fn is_open(&self) -> bool {
        self.open_shares > Decimal::ZERO && self.cancel.is_none()
    }
}

pub struct OrderRegistry {
    next_id: AtomicU64,
    orders: DashMap<OrderId, RwLock<OrderRecord>>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            orders: DashMap::with_capacity(capacity),
        }
    }

    /// Assigns the next id and stores `descriptor` in its initial open
    /// state. Ids are monotonically increasing and double as the
    /// deterministic secondary tie-break key.
    pub fn register(&self, descriptor: OrderDescriptor) -> OrderId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let open_shares = descriptor.original_amount;
        self.orders.insert(
            id,
            RwLock::new(OrderRecord {
                descriptor,
                open_shares,
                fills: Vec::new(),
                cancel: None,
            }),
        );
        id
    }

    pub fn get(&self, id: OrderId) -> Result<OrderSnapshot> {
        let entry = self
            .orders
            .get(&id)
            .ok_or(ExchangeError::UnknownOrder { order_id: id })?;
        let record = entry.read();
        Ok(OrderSnapshot {
            id,
            account_id: record.descriptor.account_id,
            sym: record.descriptor.sym.clone(),
            side: record.descriptor.side,
            limit_price: record.descriptor.limit_price,
            original_amount: record.descriptor.original_amount,
            created_at: record.descriptor.created_at,
            open_shares: record.open_shares,
            fills: record.fills.clone(),
            cancel: record.cancel,
        })
    }

    /// Appends a fill and decrements `open_shares`. Returns
    /// [`ExchangeError::Internal`] rather than ever driving `open_shares`
    /// negative — that would indicate a bug in the matching loop, not a
    /// user error.
    pub fn apply_fill(&self, id: OrderId, shares: Quantity, price: Price, time: i64) -> Result<()> {
        let entry = self
            .orders
            .get(&id)
            .ok_or(ExchangeError::UnknownOrder { order_id: id })?;
        let mut record = entry.write();
        if shares > record.open_shares {
            return Err(ExchangeError::Internal(format!(
                "fill of {shares} shares exceeds open remainder {} on order {id}",
                record.open_shares
            )));
        }
        record.open_shares -= shares;
        record.fills.push(FillRecord { shares, price, time });
        Ok(())
    }

    /// Cancels the current open remainder. `shares` must equal
    /// `open_shares` at the moment of the call — the caller (the matching
    /// engine, under the symbol lock) is responsible for that.
    pub fn apply_cancel(&self, id: OrderId, shares: Quantity, time: i64) -> Result<()> {
        let entry = self
            .orders
            .get(&id)
            .ok_or(ExchangeError::UnknownOrder { order_id: id })?;
        let mut record = entry.write();
        if record.open_shares <= Decimal::ZERO || record.cancel.is_some() {
            return Err(ExchangeError::NotOpen { order_id: id });
        }
        record.cancel = Some(CancelRecord {
            shares_cancelled: shares,
            time,
        });
        record.open_shares = Decimal::ZERO;
        Ok(())
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn descriptor(side: Side) -> OrderDescriptor {
        OrderDescriptor {
            account_id: 1,
            sym: "SPY".to_string(),
            side,
            limit_price: dec!(10),
            original_amount: dec!(100),
            created_at: 0,
        }
    }

    #[test]
    fn register_assigns_monotonic_ids() {
        let registry = OrderRegistry::new();
        let a = registry.register(descriptor(Side::Buy));
        let b = registry.register(descriptor(Side::Sell));
        assert!(b > a);
    }

    #[test]
    fn apply_fill_then_apply_cancel_conserves_original_amount() {
        let registry = OrderRegistry::new();
        let id = registry.register(descriptor(Side::Buy));
        registry.apply_fill(id, dec!(40), dec!(9), 1).unwrap();
        let snap = registry.get(id).unwrap();
        assert_eq!(snap.open_shares, dec!(60));
        registry.apply_cancel(id, dec!(60), 2).unwrap();
        let snap = registry.get(id).unwrap();
        assert!(!snap.is_open());
        assert_eq!(
            snap.open_shares + snap.fills.iter().map(|f| f.shares).sum::<Decimal>()
                + snap.cancel.unwrap().shares_cancelled,
            snap.original_amount
        );
    }

    #[test]
    fn second_cancel_is_rejected() {
        let registry = OrderRegistry::new();
        let id = registry.register(descriptor(Side::Sell));
        registry.apply_cancel(id, dec!(100), 1).unwrap();
        let err = registry.apply_cancel(id, dec!(0), 2).unwrap_err();
        assert_eq!(err, ExchangeError::NotOpen { order_id: id });
    }

    #[test]
    fn fill_exceeding_open_remainder_is_internal_error() {
        let registry = OrderRegistry::new();
        let id = registry.register(descriptor(Side::Buy));
        let err = registry.apply_fill(id, dec!(200), dec!(9), 1).unwrap_err();
        assert!(matches!(err, ExchangeError::Internal(_)));
    }

    #[test]
    fn unknown_order_is_reported() {
        let registry = OrderRegistry::new();
        assert_eq!(
            registry.get(999).unwrap_err(),
            ExchangeError::UnknownOrder { order_id: 999 }
        );
    }
}
