//! The façade that ties the order book, ledger, and registry together into
//! one accept/match/cancel/query surface.

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::book::{BookOrder, FillEvent, OrderBook};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ExchangeError, Result};
use crate::ledger::{AccountSnapshot, Ledger};
use crate::registry::{OrderDescriptor, OrderRegistry, OrderSnapshot};
use crate::types::{AccountId, OrderId, Price, Quantity, Side, Symbol};

/// A matching engine and its supporting ledger and order registry.
///
/// Each symbol's book is guarded by its own lock (via an internal
/// [`DashMap`]), so orders against distinct symbols never contend. Within
/// one symbol, [`Exchange::place_order`] and [`Exchange::cancel`] hold that
/// symbol's lock for their full duration, making each call atomic with
/// respect to every other order on the same symbol.
pub struct Exchange {
    ledger: Ledger,
    registry: OrderRegistry,
    books: DashMap<Symbol, Mutex<OrderBook>>,
    clock: Box<dyn Clock>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Injects a specific [`Clock`] implementation — tests use this with
    /// [`crate::TestClock`] to get deterministic `created_at`/fill
    /// timestamps.
    pub fn with_clock(config: Config, clock: Box<dyn Clock>) -> Self {
        Self {
            ledger: Ledger::with_capacity(
                config.initial_account_capacity,
                config.initial_symbol_capacity,
            ),
            registry: OrderRegistry::with_capacity(config.initial_account_capacity * 4),
            books: DashMap::with_capacity(config.initial_symbol_capacity),
            clock,
        }
    }

    pub fn create_account(&self, id: AccountId, opening_balance: Decimal) -> Result<()> {
        self.ledger.create_account(id, opening_balance)?;
        debug!(account_id = id, balance = %opening_balance, "account created");
        Ok(())
    }

    pub fn create_or_add_shares(&self, sym: &Symbol, id: AccountId, num: Quantity) -> Result<()> {
        self.ledger.create_or_add_shares(sym, id, num)?;
        debug!(account_id = id, sym = %sym, shares = %num, "shares credited outside the market");
        Ok(())
    }

    pub fn account_snapshot(&self, id: AccountId) -> Result<AccountSnapshot> {
        self.ledger.snapshot(id)
    }

    pub fn query(&self, order_id: OrderId) -> Result<OrderSnapshot> {
        self.registry.get(order_id)
    }

    fn book_for(&self, sym: &Symbol) -> dashmap::mapref::one::Ref<'_, Symbol, Mutex<OrderBook>> {
        if let Some(book) = self.books.get(sym) {
            return book;
        }
        self.books
            .entry(sym.clone())
            .or_insert_with(|| Mutex::new(OrderBook::new(sym.clone())));
        self.books.get(sym).expect("book just inserted")
    }

    /// Validates and accepts a new limit order, matches it against the
    /// resting book for `sym`, settles every resulting fill, and rests any
    /// unfilled remainder. Returns the new order's id.
    ///
    /// `side == Side::Buy` reserves `amount * limit_price` funds up front;
    /// `side == Side::Sell` reserves `amount` shares up front. Both
    /// reservations are released back (in full or in part) as the order
    /// fills or is later cancelled.
    pub fn place_order(
        &self,
        account_id: AccountId,
        sym: &Symbol,
        side: Side,
        limit_price: Price,
        amount: Quantity,
    ) -> Result<OrderId> {
        if limit_price <= Decimal::ZERO {
            return Err(ExchangeError::MalformedRequest {
                reason: format!("limit price must be positive, got {limit_price}"),
            });
        }
        if amount <= Decimal::ZERO {
            return Err(ExchangeError::MalformedRequest {
                reason: format!("order amount must be positive, got {amount}"),
            });
        }

        match side {
            Side::Buy => self.ledger.reserve_funds(account_id, amount * limit_price)?,
            Side::Sell => self.ledger.reserve_shares(account_id, sym, amount)?,
        }

        let book_ref = self.book_for(sym);
        let mut book = book_ref.lock();

        let created_at = self.clock.now();
        let order_id = self.registry.register(OrderDescriptor {
            account_id,
            sym: sym.clone(),
            side,
            limit_price,
            original_amount: amount,
            created_at,
        });

        let incoming = BookOrder {
            id: order_id,
            account_id,
            side,
            limit_price,
            created_at,
            open_shares: amount,
        };

        info!(order_id, account_id, sym = %sym, %side, %limit_price, %amount, "order accepted");

        let remaining = book.run_match(incoming, |event| self.settle_fill(event))?;

        if remaining.open_shares > Decimal::ZERO {
            book.insert(remaining);
        }

        Ok(order_id)
    }

    /// Applies one executed trade: records it against both orders and
    /// moves funds/shares between the two accounts.
    fn settle_fill(&self, event: FillEvent) -> Result<()> {
        let now = self.clock.now();
        self.registry
            .apply_fill(event.incoming_id, event.shares, event.price, now)?;
        self.registry
            .apply_fill(event.contra_id, event.shares, event.price, now)?;

        let (buy_order_id, sell_order_id, buyer, seller) = match event.incoming_side {
            Side::Buy => (
                event.incoming_id,
                event.contra_id,
                event.incoming_account,
                event.contra_account,
            ),
            Side::Sell => (
                event.contra_id,
                event.incoming_id,
                event.contra_account,
                event.incoming_account,
            ),
        };
        let proceeds = event.shares * event.price;

        self.ledger.credit_shares(buyer, &event.sym, event.shares)?;
        self.ledger.credit_funds(seller, proceeds)?;

        if event.incoming_side == Side::Buy {
            let overpay = event.shares * (event.incoming_limit - event.price);
            if overpay > Decimal::ZERO {
                self.ledger.refund_funds(event.incoming_account, overpay)?;
            }
        }

        info!(
            sym = %event.sym,
            buy_order_id,
            sell_order_id,
            quantity = %event.shares,
            price = %event.price,
            "fill executed"
        );
        Ok(())
    }

    /// Cancels whatever remains open on `order_id`, refunding the
    /// corresponding reservation. A no-op order (already fully filled or
    /// already cancelled) returns [`ExchangeError::NotOpen`].
    pub fn cancel(&self, order_id: OrderId) -> Result<()> {
        let snapshot = self.registry.get(order_id)?;
        if !snapshot.is_open() {
            return Err(ExchangeError::NotOpen { order_id });
        }

        let book_ref = self.book_for(&snapshot.sym);
        let mut book = book_ref.lock();

        // `snapshot` was read before this lock was taken, so a concurrent
        // fill on the same symbol may have fully consumed and removed this
        // order in the meantime. That's an ordinary race, not a corrupt
        // registry, so it resolves to the same error a second cancel would
        // get.
        let Some(removed) = book.remove(snapshot.side, snapshot.limit_price, order_id) else {
            debug!(order_id, "order filled out from under a racing cancel");
            return Err(ExchangeError::NotOpen { order_id });
        };

        let now = self.clock.now();
        self.registry
            .apply_cancel(order_id, removed.open_shares, now)?;

        match removed.side {
            Side::Buy => self
                .ledger
                .refund_funds(removed.account_id, removed.open_shares * removed.limit_price)?,
            Side::Sell => self
                .ledger
                .credit_shares(removed.account_id, &snapshot.sym, removed.open_shares)?,
        }

        info!(order_id, shares = %removed.open_shares, "order cancelled");
        Ok(())
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
