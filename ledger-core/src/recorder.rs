//! Transaction recorder
//!
//! Validates and commits a single signed ledger entry under an idempotency
//! key. Order of checks matters: malformed input fails before any store
//! access; the duplicate-key check runs against the entire ledger history
//! before the overdraft check; the entry is appended through the
//! single-writer actor and only then mirrored.

use crate::{
    actor::LedgerHandle,
    balance,
    clock::CommitClock,
    error::{Error, Result},
    metrics::Metrics,
    mirror::LogSink,
    store::{Column, LedgerStore},
    types::{EntryKind, LedgerEntry, Receipt, RecordRequest},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Commits single transactions
pub struct TransactionRecorder {
    store: Arc<dyn LedgerStore>,
    writer: LedgerHandle,
    sink: Arc<dyn LogSink>,
    clock: Arc<CommitClock>,
    metrics: Metrics,
}

impl TransactionRecorder {
    /// Create a recorder over shared ledger plumbing
    pub fn new(
        store: Arc<dyn LedgerStore>,
        writer: LedgerHandle,
        sink: Arc<dyn LogSink>,
        clock: Arc<CommitClock>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            writer,
            sink,
            clock,
            metrics,
        }
    }

    /// Validate and commit one transaction.
    ///
    /// `request.amount` is the positive magnitude; the signed amount stored in
    /// the ledger is derived from `request.kind`. Fails with
    /// [`Error::DuplicateTransaction`] on a reused idempotency key, with
    /// [`Error::InsufficientBalance`] when a spend exceeds the current
    /// balance, and with [`Error::MirrorFailed`] when the entry committed but
    /// the log sink did not accept the copy (the append is not rolled back).
    pub async fn record(&self, request: RecordRequest) -> Result<Receipt> {
        let (customer, idempotency_key) = validate(&request)?;

        // Duplicate keys are checked against the entire ledger history
        let used_keys = self.store.scan_column(Column::IdempotencyKey)?;
        if used_keys.iter().any(|key| *key == idempotency_key) {
            return Err(Error::DuplicateTransaction {
                key: idempotency_key,
            });
        }

        let signed_amount = match request.kind {
            EntryKind::TopUp => request.amount,
            EntryKind::Spend => {
                let snapshot = self.store.scan_all()?;
                let current = balance::balance_of(&customer, &snapshot);
                if current < request.amount {
                    return Err(Error::InsufficientBalance {
                        customer,
                        balance: current,
                        requested: request.amount,
                    });
                }
                -request.amount
            }
        };

        let entry = LedgerEntry {
            timestamp: self.clock.next(),
            transaction_id: Uuid::now_v7(),
            customer,
            kind: request.kind,
            amount: signed_amount,
            actor_email: request.actor_email,
            note: request.note,
            idempotency_key,
        };

        let started = Instant::now();
        let transaction_id = self.writer.append(entry.clone()).await?;
        self.metrics
            .record_append_duration(started.elapsed().as_secs_f64());
        self.metrics.record_entry(entry.kind);

        tracing::info!(
            transaction_id = %transaction_id,
            customer = %entry.customer,
            kind = %entry.kind,
            amount = %entry.amount,
            actor = %entry.actor_email,
            "Transaction committed"
        );

        // Mirror is best-effort: surface the failure, keep the ledger write
        if let Err(e) = self.sink.append_formatted_entry(&entry) {
            tracing::warn!(
                transaction_id = %transaction_id,
                error = %e,
                "Log mirror rejected committed entry"
            );
            return Err(Error::MirrorFailed {
                transaction_id,
                reason: e.to_string(),
            });
        }

        Ok(Receipt {
            transaction_id,
            timestamp: entry.timestamp,
        })
    }
}

/// Fail fast on malformed input, before any store access.
///
/// Returns the trimmed customer name and idempotency key.
fn validate(request: &RecordRequest) -> Result<(String, String)> {
    if request.amount <= Decimal::ZERO {
        return Err(Error::Validation(
            "amount must be a positive number".to_string(),
        ));
    }

    let customer = request.customer.trim();
    if customer.is_empty() {
        return Err(Error::Validation(
            "customer name must not be empty".to_string(),
        ));
    }

    let idempotency_key = request.idempotency_key.trim();
    if idempotency_key.is_empty() {
        return Err(Error::Validation(
            "idempotency key must not be empty".to_string(),
        ));
    }

    Ok((customer.to_string(), idempotency_key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::NullSink;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};

    struct FailingSink;

    impl LogSink for FailingSink {
        fn append_formatted_entry(&self, _entry: &LedgerEntry) -> Result<()> {
            Err(Error::Store("sink down".to_string()))
        }

        fn append_batch_marker(
            &self,
            _batch_key: &str,
            _timestamp: DateTime<Utc>,
            _row_count: usize,
        ) -> Result<()> {
            Err(Error::Store("sink down".to_string()))
        }
    }

    fn recorder_over(
        store: Arc<MemoryStore>,
        sink: Arc<dyn LogSink>,
    ) -> TransactionRecorder {
        let writer = crate::actor::spawn_append_actor(store.clone());
        TransactionRecorder::new(
            store,
            writer,
            sink,
            Arc::new(CommitClock::new()),
            Metrics::new().unwrap(),
        )
    }

    fn topup(customer: &str, cents: i64, key: &str) -> RecordRequest {
        RecordRequest {
            customer: customer.to_string(),
            kind: EntryKind::TopUp,
            amount: Decimal::new(cents, 2),
            note: String::new(),
            idempotency_key: key.to_string(),
            actor_email: "staff@cashrail.example".to_string(),
        }
    }

    fn spend(customer: &str, cents: i64, key: &str) -> RecordRequest {
        RecordRequest {
            kind: EntryKind::Spend,
            ..topup(customer, cents, key)
        }
    }

    #[tokio::test]
    async fn topup_commits_positive_entry() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        let receipt = recorder.record(topup("Alice", 5000, "k1")).await.unwrap();

        let rows = store.scan_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_id, receipt.transaction_id);
        assert_eq!(rows[0].amount, Decimal::new(5000, 2));
        assert_eq!(rows[0].kind, EntryKind::TopUp);
        assert_eq!(rows[0].customer, "Alice");
    }

    #[tokio::test]
    async fn spend_commits_negative_entry() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        recorder.record(topup("alice", 5000, "k1")).await.unwrap();
        recorder.record(spend("alice", 1200, "k2")).await.unwrap();

        let rows = store.scan_all().unwrap();
        assert_eq!(rows[1].amount, Decimal::new(-1200, 2));
        assert_eq!(rows[1].kind, EntryKind::Spend);
    }

    #[tokio::test]
    async fn duplicate_key_rejected_with_no_new_rows() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        recorder.record(topup("alice", 5000, "k1")).await.unwrap();
        let result = recorder.record(topup("alice", 5000, "k1")).await;

        assert!(matches!(
            result,
            Err(Error::DuplicateTransaction { key }) if key == "k1"
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn overdraft_rejected_with_balance_detail() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        recorder.record(topup("alice", 4000, "k1")).await.unwrap();
        let result = recorder.record(spend("alice", 4001, "k2")).await;

        match result {
            Err(Error::InsufficientBalance {
                customer,
                balance,
                requested,
            }) => {
                assert_eq!(customer, "alice");
                assert_eq!(balance, Decimal::new(4000, 2));
                assert_eq!(requested, Decimal::new(4001, 2));
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn spend_of_exact_balance_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        recorder.record(topup("alice", 4000, "k1")).await.unwrap();
        recorder.record(spend("alice", 4000, "k2")).await.unwrap();

        let snapshot = store.scan_all().unwrap();
        assert_eq!(balance::balance_of("alice", &snapshot), Decimal::ZERO);
    }

    #[tokio::test]
    async fn validation_fails_before_any_store_access() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        for bad in [
            topup("alice", 0, "k1"),
            topup("alice", -100, "k1"),
            topup("   ", 100, "k1"),
            topup("alice", 100, "  "),
        ] {
            assert!(matches!(
                recorder.record(bad).await,
                Err(Error::Validation(_))
            ));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn mirror_failure_surfaces_but_keeps_the_ledger_write() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(FailingSink));

        let result = recorder.record(topup("alice", 5000, "k1")).await;

        let rows = store.scan_all().unwrap();
        assert_eq!(rows.len(), 1);
        match result {
            Err(Error::MirrorFailed { transaction_id, .. }) => {
                assert_eq!(transaction_id, rows[0].transaction_id);
            }
            other => panic!("expected MirrorFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn customer_and_key_are_stored_trimmed() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(store.clone(), Arc::new(NullSink));

        recorder
            .record(topup("  Alice  ", 1000, "  k1  "))
            .await
            .unwrap();

        let rows = store.scan_all().unwrap();
        assert_eq!(rows[0].customer, "Alice");
        assert_eq!(rows[0].idempotency_key, "k1");
    }
}
