//! Per-symbol order book: two price-ordered sides, FIFO within a price
//! level, with the matching loop that crosses them.

use std::collections::{BTreeMap, VecDeque};

use crate::error::Result;
use crate::types::{AccountId, OrderId, Price, Quantity, Side, Symbol};

/// An order's working state while it rests on (or crosses) a book. This is
/// a lightweight mirror of the authoritative [`crate::registry::OrderRegistry`]
/// record — kept in lockstep with it inside the same symbol-lock critical
/// section so the two never observably disagree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BookOrder {
    pub id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub limit_price: Price,
    pub created_at: i64,
    pub open_shares: Quantity,
}

struct PriceLevel {
    orders: VecDeque<BookOrder>,
    total_open: Quantity,
}

impl PriceLevel {
    fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_open: Quantity::ZERO,
        }
    }

    fn push(&mut self, order: BookOrder) {
        self.total_open += order.open_shares;
        self.orders.push_back(order);
    }

    fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// One executed trade produced by [`OrderBook::run_match`].
///
/// `incoming_limit` and `sym` are carried along so the caller can compute
/// the buyer's overpay refund and credit shares without looking anything
/// else up.
#[derive(Debug, Clone)]
pub(crate) struct FillEvent {
    pub sym: Symbol,
    pub incoming_id: OrderId,
    pub incoming_account: AccountId,
    pub incoming_side: Side,
    pub incoming_limit: Price,
    pub contra_id: OrderId,
    pub contra_account: AccountId,
    pub shares: Quantity,
    pub price: Price,
}

pub(crate) struct OrderBook {
    sym: Symbol,
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
}

impl OrderBook {
    pub(crate) fn new(sym: Symbol) -> Self {
        Self {
            sym,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    fn side_map(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Best price currently resting on `side` — highest for bids, lowest
    /// for asks.
    fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.keys().next_back().copied(),
            Side::Sell => self.asks.keys().next().copied(),
        }
    }

    pub(crate) fn best_bid(&self) -> Option<Price> {
        self.best_price(Side::Buy)
    }

    pub(crate) fn best_ask(&self) -> Option<Price> {
        self.best_price(Side::Sell)
    }

    pub(crate) fn open_quantity_at(&self, side: Side, price: Price) -> Quantity {
        self.side_map(side)
            .get(&price)
            .map(|level| level.total_open)
            .unwrap_or(Quantity::ZERO)
    }

    /// Inserts an order with remaining open quantity into its side of the
    /// book. Callers must not insert a fully-filled order.
    pub(crate) fn insert(&mut self, order: BookOrder) {
        debug_assert!(order.open_shares > Quantity::ZERO);
        self.side_map_mut(order.side)
            .entry(order.limit_price)
            .or_insert_with(PriceLevel::new)
            .push(order);
    }

    /// Removes a specific order from the book, if present.
    pub(crate) fn remove(&mut self, side: Side, price: Price, id: OrderId) -> Option<BookOrder> {
        let map = self.side_map_mut(side);
        let level = map.get_mut(&price)?;
        let mut removed = None;
        let mut remaining = Quantity::ZERO;
        level.orders.retain(|o| {
            if o.id == id {
                removed = Some(*o);
                false
            } else {
                remaining += o.open_shares;
                true
            }
        });
        if removed.is_some() {
            level.total_open = remaining;
            if level.is_empty() {
                map.remove(&price);
            }
        }
        removed
    }

    /// Crosses `incoming` against the contra side until it is fully filled,
    /// no compatible contra order remains, or the next compatible contra
    /// order's price is not crossable. Calls `on_fill` once per trade —
    /// book-side bookkeeping (quantity reduction, level removal) for that
    /// trade is already applied before the callback runs.
    ///
    /// Returns the incoming order's final working state (its `open_shares`
    /// may be zero, in which case the caller must not insert it into the
    /// book).
    pub(crate) fn run_match(
        &mut self,
        mut incoming: BookOrder,
        mut on_fill: impl FnMut(FillEvent) -> Result<()>,
    ) -> Result<BookOrder> {
        loop {
            if incoming.open_shares <= Quantity::ZERO {
                break;
            }
            let contra_side = incoming.side.contra();
            let Some(price) = self.best_price(contra_side) else {
                break;
            };
            let compatible = match incoming.side {
                Side::Buy => price <= incoming.limit_price,
                Side::Sell => price >= incoming.limit_price,
            };
            if !compatible {
                break;
            }

            let map = self.side_map_mut(contra_side);
            let level = map.get_mut(&price).expect("best price key must map to a level");

            let fill_shares = {
                let contra_front = level.orders.front_mut().expect("non-empty price level");
                let fill_shares = incoming.open_shares.min(contra_front.open_shares);
                contra_front.open_shares -= fill_shares;
                fill_shares
            };
            level.total_open -= fill_shares;
            incoming.open_shares -= fill_shares;

            let contra_front = *level.orders.front().expect("non-empty price level");
            if contra_front.open_shares <= Quantity::ZERO {
                level.orders.pop_front();
            }
            if level.is_empty() {
                map.remove(&price);
            }

            let event = FillEvent {
                sym: self.sym.clone(),
                incoming_id: incoming.id,
                incoming_account: incoming.account_id,
                incoming_side: incoming.side,
                incoming_limit: incoming.limit_price,
                contra_id: contra_front.id,
                contra_account: contra_front.account_id,
                shares: fill_shares,
                price,
            };
            on_fill(event)?;
        }
        Ok(incoming)
    }
}
