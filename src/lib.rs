//! Price-time priority matching engine, ledger, and order registry for an
//! exchange core.
//!
//! [`Exchange`] is the façade most callers want: it owns the ledger, the
//! order registry, and one order book per symbol, and exposes account/order
//! operations as a set of independently atomic methods.

mod book;
mod clock;
mod config;
mod engine;
mod error;
mod ledger;
mod registry;
mod types;

pub use clock::{Clock, SystemClock, TestClock};
pub use config::Config;
pub use engine::Exchange;
pub use error::{ExchangeError, Result};
pub use ledger::AccountSnapshot;
pub use registry::{CancelRecord, FillRecord, OrderSnapshot};
pub use types::{AccountId, OrderId, Price, Quantity, Side, Symbol};
