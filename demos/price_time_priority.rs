use exchange_core::{Exchange, Side};
use rust_decimal::Decimal;

fn main() {
    let ex = Exchange::new();
    let sym = "X".to_string();

    for id in 1..=4u64 {
        ex.create_account(id, Decimal::from(100_000)).unwrap();
        ex.create_or_add_shares(&sym, id, Decimal::from(1000)).unwrap();
    }

    ex.place_order(1, &sym, Side::Sell, Decimal::from(102), Decimal::from(5))
        .unwrap();
    ex.place_order(2, &sym, Side::Sell, Decimal::from(100), Decimal::from(5))
        .unwrap();
    ex.place_order(3, &sym, Side::Sell, Decimal::from(101), Decimal::from(5))
        .unwrap();

    let order_id = ex
        .place_order(4, &sym, Side::Buy, Decimal::from(102), Decimal::from(12))
        .unwrap();
    let snap = ex.query(order_id).unwrap();

    println!("Fills in price-then-time order:");
    for fill in &snap.fills {
        println!("{} shares @ {}", fill.shares, fill.price);
    }

    assert_eq!(snap.fills[0].price, Decimal::from(100));
    assert_eq!(snap.fills[1].price, Decimal::from(101));
    assert_eq!(snap.fills[2].price, Decimal::from(102));
}
