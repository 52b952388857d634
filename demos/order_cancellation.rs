use exchange_core::{Exchange, Side};
use rust_decimal::Decimal;

fn main() {
    let ex = Exchange::new();
    let sym = "SPY".to_string();
    ex.create_account(1, Decimal::from(100_000)).unwrap();

    let bid = ex
        .place_order(1, &sym, Side::Buy, Decimal::from(100), Decimal::from(50))
        .unwrap();
    ex.place_order(1, &sym, Side::Buy, Decimal::from(99), Decimal::from(75))
        .unwrap();

    println!("Cancelling order {bid}");
    ex.cancel(bid).unwrap();

    let snap = ex.query(bid).unwrap();
    println!("Open after cancellation: {}", snap.open_shares);
    assert!(!snap.is_open());
    assert_eq!(snap.cancel.unwrap().shares_cancelled, Decimal::from(50));

    let err = ex.cancel(bid).unwrap_err();
    println!("Cancelling again: {err}");
}
