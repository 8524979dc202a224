//! Balance computation
//!
//! A customer has no stored balance; the balance is always the sum of the
//! signed amounts of every ledger entry whose normalized customer name
//! matches. These functions are pure folds over one ledger snapshot and
//! never touch the store.

use crate::types::{customer_key, LedgerEntry};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Balance of one customer over the given snapshot.
///
/// A customer with zero matching entries has balance 0; that is a valid
/// answer, not an error.
pub fn balance_of(customer: &str, snapshot: &[LedgerEntry]) -> Decimal {
    let key = customer_key(customer);
    snapshot
        .iter()
        .filter(|entry| entry.customer_key() == key)
        .fold(Decimal::ZERO, |acc, entry| acc + entry.amount)
}

/// Balances for many customers over one shared snapshot.
///
/// Single pass over the snapshot; per-name results are identical to calling
/// [`balance_of`] once per name. The returned map is keyed by the names as
/// given (duplicate names that normalize identically collapse onto the same
/// balance).
pub fn batch_balances_of<S: AsRef<str>>(
    customers: &[S],
    snapshot: &[LedgerEntry],
) -> HashMap<String, Decimal> {
    let mut by_key: HashMap<String, Decimal> = customers
        .iter()
        .map(|name| (customer_key(name.as_ref()), Decimal::ZERO))
        .collect();

    for entry in snapshot {
        if let Some(balance) = by_key.get_mut(&entry.customer_key()) {
            *balance += entry.amount;
        }
    }

    customers
        .iter()
        .map(|name| {
            let balance = by_key[&customer_key(name.as_ref())];
            (name.as_ref().to_string(), balance)
        })
        .collect()
}
