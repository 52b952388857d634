//! Stresses the per-symbol locking model with real OS threads racing
//! against a single shared [`Exchange`].

use std::sync::Arc;
use std::thread;

use exchange_core::{Config, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn concurrent_orders_on_the_same_symbol_never_lose_or_duplicate_shares() {
    let ex = Arc::new(exchange_core::Exchange::with_config(Config::default()));
    let sym = "X".to_string();
    let seller_count = 8u64;
    let buyer_count = 8u64;

    for id in 1..=(seller_count + buyer_count) {
        ex.create_account(id, dec!(1_000_000)).unwrap();
    }
    for id in 1..=seller_count {
        ex.create_or_add_shares(&sym, id, dec!(100)).unwrap();
    }

    let mut handles = Vec::new();
    for id in 1..=seller_count {
        let ex = Arc::clone(&ex);
        let sym = sym.clone();
        handles.push(thread::spawn(move || {
            ex.place_order(id, &sym, Side::Sell, dec!(10), dec!(100)).unwrap();
        }));
    }
    for id in (seller_count + 1)..=(seller_count + buyer_count) {
        let ex = Arc::clone(&ex);
        let sym = sym.clone();
        handles.push(thread::spawn(move || {
            ex.place_order(id, &sym, Side::Buy, dec!(10), dec!(100)).unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let total_shares: Decimal = (1..=(seller_count + buyer_count))
        .map(|id| {
            ex.account_snapshot(id)
                .unwrap()
                .positions
                .get(&sym)
                .copied()
                .unwrap_or(Decimal::ZERO)
        })
        .sum();
    assert_eq!(total_shares, dec!(800));
}

#[test]
fn concurrent_orders_on_distinct_symbols_all_complete() {
    let ex = Arc::new(exchange_core::Exchange::with_config(Config::default()));
    let symbols: Vec<String> = (0..4).map(|i| format!("SYM{i}")).collect();

    for (i, sym) in symbols.iter().enumerate() {
        let seller = i as u64 * 2 + 1;
        let buyer = i as u64 * 2 + 2;
        ex.create_account(seller, dec!(0)).unwrap();
        ex.create_account(buyer, dec!(10_000)).unwrap();
        ex.create_or_add_shares(sym, seller, dec!(50)).unwrap();
    }

    let mut handles = Vec::new();
    for (i, sym) in symbols.into_iter().enumerate() {
        let ex = Arc::clone(&ex);
        let seller = i as u64 * 2 + 1;
        let buyer = i as u64 * 2 + 2;
        handles.push(thread::spawn(move || {
            ex.place_order(seller, &sym, Side::Sell, dec!(20), dec!(50)).unwrap();
            ex.place_order(buyer, &sym, Side::Buy, dec!(20), dec!(50)).unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}
