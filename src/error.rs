use crate::types::{AccountId, OrderId, Symbol};
use rust_decimal::Decimal;
use thiserror::Error;

/// Every distinct failure outcome the core can report.
///
/// All variants except [`ExchangeError::Internal`] are per-child failures:
/// reported back to the caller for the one order/query/cancel that produced
/// them and do not affect sibling operations in the same request. `Internal`
/// signals an invariant violation or a detected bug rather than a user
/// error; callers should treat it as fatal to the current request and may
/// choose to abort the process rather than continue with state they can no
/// longer trust.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("unknown account: {account_id}")]
    UnknownAccount { account_id: AccountId },

    #[error("account already exists: {account_id}")]
    DuplicateAccount { account_id: AccountId },

    #[error("unknown order: {order_id}")]
    UnknownOrder { order_id: OrderId },

    #[error("order {order_id} has no open remainder")]
    NotOpen { order_id: OrderId },

    #[error("insufficient funds for account {account_id}: need {needed}, have {available}")]
    InsufficientFunds {
        account_id: AccountId,
        needed: Decimal,
        available: Decimal,
    },

    #[error(
        "insufficient {sym} shares for account {account_id}: need {needed}, have {available}"
    )]
    InsufficientShares {
        account_id: AccountId,
        sym: Symbol,
        needed: Decimal,
        available: Decimal,
    },

    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("internal invariant violation: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
