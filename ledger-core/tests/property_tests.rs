//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify the critical invariants:
//! - Balance is always the sum of signed amounts, case/trim-insensitively
//! - Idempotency: a reused key commits exactly one entry
//! - Overdraft prevention: a rejected spend writes nothing
//! - Batch checkout never drives any balance below zero

use ledger_core::balance::{balance_of, batch_balances_of};
use ledger_core::mirror::NullSink;
use ledger_core::store::{LedgerStore, MemoryStore};
use ledger_core::{CheckoutRow, Config, EntryKind, Error, Ledger, RecordRequest};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

const ACTOR: &str = "staff@cashrail.example";

/// Strategy for positive amounts in cents
fn cents_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000
}

/// Strategy for small customer pools so collisions actually happen
fn customer_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("alice".to_string()),
        Just("Bob".to_string()),
        Just("  CAROL ".to_string()),
        Just("dave".to_string()),
    ]
}

fn record_request(customer: &str, kind: EntryKind, cents: i64, key: &str) -> RecordRequest {
    RecordRequest {
        customer: customer.to_string(),
        kind,
        amount: Decimal::new(cents, 2),
        note: String::new(),
        idempotency_key: key.to_string(),
        actor_email: ACTOR.to_string(),
    }
}

fn create_test_ledger() -> (Ledger, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let ledger = Ledger::with_store(store.clone(), Arc::new(NullSink), Config::default()).unwrap();
    (ledger, store)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: after any sequence of accepted operations, every balance is
    /// the sum of that customer's signed amounts and never negative.
    #[test]
    fn prop_balance_is_derived_and_never_negative(
        ops in prop::collection::vec(
            (customer_strategy(), cents_strategy(), prop::bool::ANY),
            1..40,
        )
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, store) = create_test_ledger();

            for (i, (customer, cents, is_spend)) in ops.iter().enumerate() {
                let kind = if *is_spend { EntryKind::Spend } else { EntryKind::TopUp };
                let request = record_request(customer, kind, *cents, &format!("key-{i}"));
                // Spends may be rejected for insufficient balance; that is fine
                let _ = ledger.record(request).await;
            }

            let snapshot = store.scan_all().unwrap();
            for name in ["alice", "bob", "carol", "dave"] {
                let expected = snapshot
                    .iter()
                    .filter(|e| e.customer.trim().to_lowercase() == name)
                    .fold(Decimal::ZERO, |acc, e| acc + e.amount);
                let got = ledger.balance_of(name).unwrap();
                prop_assert_eq!(got, expected);
                prop_assert!(got >= Decimal::ZERO);
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: reusing an idempotency key commits exactly one entry.
    #[test]
    fn prop_duplicate_key_commits_once(cents in cents_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, store) = create_test_ledger();

            let first = ledger
                .record(record_request("alice", EntryKind::TopUp, cents, "same-key"))
                .await;
            prop_assert!(first.is_ok());

            let second = ledger
                .record(record_request("alice", EntryKind::TopUp, cents, "same-key"))
                .await;
            prop_assert!(matches!(second, Err(Error::DuplicateTransaction { .. })));
            prop_assert_eq!(store.len(), 1);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: a spend above the current balance writes nothing.
    #[test]
    fn prop_overdraft_writes_nothing(balance_cents in cents_strategy(), extra in 1i64..1000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, store) = create_test_ledger();

            ledger
                .record(record_request("alice", EntryKind::TopUp, balance_cents, "k1"))
                .await
                .unwrap();

            let result = ledger
                .record(record_request("alice", EntryKind::Spend, balance_cents + extra, "k2"))
                .await;
            prop_assert!(matches!(result, Err(Error::InsufficientBalance { .. })));
            prop_assert_eq!(store.len(), 1);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: batched balances equal individual lookups over one snapshot.
    #[test]
    fn prop_batch_balances_match_individual(
        entries in prop::collection::vec((customer_strategy(), cents_strategy()), 0..30)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, store) = create_test_ledger();

            for (i, (customer, cents)) in entries.iter().enumerate() {
                ledger
                    .record(record_request(customer, EntryKind::TopUp, *cents, &format!("k{i}")))
                    .await
                    .unwrap();
            }

            let names: Vec<String> =
                ["alice", "Bob", "carol", "unknown"].iter().map(|s| s.to_string()).collect();
            let snapshot = store.scan_all().unwrap();
            let batched = batch_balances_of(&names, &snapshot);

            prop_assert_eq!(batched.len(), names.len());
            for name in &names {
                prop_assert_eq!(batched[name.as_str()], balance_of(name, &snapshot));
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: whatever the batch contents, checkout never drives any
    /// customer balance below zero and skip reasons account for every
    /// uncommitted row.
    #[test]
    fn prop_checkout_never_overdraws(
        seed_cents in prop::collection::vec(cents_strategy(), 2..4),
        rows in prop::collection::vec((customer_strategy(), -500i64..2000), 1..12)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (ledger, store) = create_test_ledger();

            for (i, cents) in seed_cents.iter().enumerate() {
                let customer = ["alice", "Bob"][i % 2];
                ledger
                    .record(record_request(customer, EntryKind::TopUp, *cents, &format!("seed-{i}")))
                    .await
                    .unwrap();
            }

            let checkout_rows: Vec<CheckoutRow> = rows
                .iter()
                .map(|(customer, cents)| CheckoutRow {
                    customer: customer.clone(),
                    amount: Decimal::new(*cents, 2),
                    note: String::new(),
                })
                .collect();

            let outcome = ledger.checkout(&checkout_rows, "batch-key", ACTOR).await.unwrap();
            prop_assert_eq!(
                outcome.transaction_count() + outcome.skipped_count(),
                checkout_rows.len()
            );

            let snapshot = store.scan_all().unwrap();
            for name in ["alice", "bob", "carol", "dave"] {
                prop_assert!(balance_of(name, &snapshot) >= Decimal::ZERO);
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}

mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn batch_reissue_commits_nothing() {
        let (ledger, store) = create_test_ledger();

        ledger
            .record(record_request("alice", EntryKind::TopUp, 10_000, "seed"))
            .await
            .unwrap();

        let rows = vec![CheckoutRow {
            customer: "alice".to_string(),
            amount: Decimal::new(500, 2),
            note: String::new(),
        }];

        ledger.checkout(&rows, "batch-1", ACTOR).await.unwrap();
        let len_after_first = store.len();

        let retry = ledger.checkout(&rows, "batch-1", ACTOR).await;
        assert!(matches!(retry, Err(Error::DuplicateTransaction { .. })));
        assert_eq!(store.len(), len_after_first);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn full_till_lifecycle() {
        let (ledger, _store) = create_test_ledger();

        // Morning: two customers top up
        ledger
            .record(record_request("Alice", EntryKind::TopUp, 4000, "t1"))
            .await
            .unwrap();
        ledger
            .record(record_request("Bob", EntryKind::TopUp, 5000, "t2"))
            .await
            .unwrap();

        // Midday: single spend at the till
        ledger
            .record(record_request("alice", EntryKind::Spend, 1000, "t3"))
            .await
            .unwrap();

        // Evening: batch checkout from the tally sheet
        let outcome = ledger
            .checkout(
                &[
                    CheckoutRow {
                        customer: "alice".to_string(),
                        amount: Decimal::new(3000, 2),
                        note: "tab".to_string(),
                    },
                    CheckoutRow {
                        customer: "bob".to_string(),
                        amount: Decimal::new(20000, 2),
                        note: "tab".to_string(),
                    },
                    CheckoutRow {
                        customer: "alice".to_string(),
                        amount: Decimal::new(2000, 2),
                        note: "tab".to_string(),
                    },
                ],
                "evening-batch",
                ACTOR,
            )
            .await
            .unwrap();

        // Alice: 40 - 10 = 30 available, first row takes all of it
        assert_eq!(outcome.transaction_count(), 1);
        assert_eq!(outcome.skipped_count(), 2);
        assert_eq!(ledger.balance_of("alice").unwrap(), Decimal::ZERO);
        assert_eq!(ledger.balance_of("bob").unwrap(), Decimal::new(5000, 2));

        // The day is fully reconstructable, newest first
        let recent = ledger.list_recent(10).unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].idempotency_key, "evening-batch");

        ledger.shutdown().await.unwrap();
    }
}
