use rust_decimal::Decimal;

/// Opaque account identifier, unique for the lifetime of the process.
pub type AccountId = u64;

/// Globally unique, monotonically increasing order identifier.
pub type OrderId = u64;

/// Opaque symbol identifier (one or more alphanumeric characters).
pub type Symbol = String;

/// USD price, or a per-share limit price. Always positive for an order.
pub type Price = Decimal;

/// Share count. May be fractional; always non-negative once absolute.
pub type Quantity = Decimal;

/// Which side of the book an order rests on.
///
/// The wire protocol this core is embedded in encodes side as the sign of
/// `amount` (positive buy, negative sell); `Exchange::place_order` takes an
/// explicit `Side` and an unsigned amount instead, so callers in this
/// process never have to decode a sign convention. There is no `Market`
/// variant — every order in this core carries a limit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side that can match against this one.
    pub fn contra(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}
