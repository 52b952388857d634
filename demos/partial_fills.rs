use exchange_core::{Exchange, Side};
use rust_decimal::Decimal;

fn main() {
    let ex = Exchange::new();
    let sym = "SPY".to_string();

    ex.create_account(1, Decimal::from(0)).unwrap();
    ex.create_account(2, Decimal::from(10_000)).unwrap();
    ex.create_or_add_shares(&sym, 1, Decimal::from(50)).unwrap();

    ex.place_order(1, &sym, Side::Sell, Decimal::from(100), Decimal::from(50))
        .unwrap();

    let buy_id = ex
        .place_order(2, &sym, Side::Buy, Decimal::from(100), Decimal::from(100))
        .unwrap();
    let snap = ex.query(buy_id).unwrap();
    let filled: Decimal = snap.fills.iter().map(|f| f.shares).sum();

    println!("Requested: 100 units");
    println!("Filled: {filled} units");
    println!("Open: {} units", snap.open_shares);

    assert_eq!(filled, Decimal::from(50));
    assert_eq!(snap.open_shares, Decimal::from(50));
}
