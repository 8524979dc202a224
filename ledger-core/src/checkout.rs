//! Batch checkout engine
//!
//! Decides, from a single consistent view of the ledger, which of many
//! proposed deductions are individually and cumulatively affordable, then
//! commits the valid subset sequentially under one shared batch idempotency
//! key. A customer appearing several times in one batch draws down a running
//! allocation so the combined rows can never overdraw. Skipped rows never
//! abort the batch; a store failure mid-commit stops immediately and reports
//! the committed prefix.

use crate::{
    actor::LedgerHandle,
    balance,
    clock::CommitClock,
    error::{Error, Result},
    metrics::Metrics,
    mirror::LogSink,
    store::{Column, LedgerStore},
    types::{
        customer_key, CheckoutOutcome, CheckoutRow, EntryKind, LedgerEntry, SkipReason, SkippedRow,
    },
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Commits batches of deductions
pub struct CheckoutEngine {
    store: Arc<dyn LedgerStore>,
    writer: LedgerHandle,
    sink: Arc<dyn LogSink>,
    clock: Arc<CommitClock>,
    metrics: Metrics,
}

/// A row that passed validation, with its 1-based input index
struct ValidRow {
    index: usize,
    customer: String,
    amount: Decimal,
    note: String,
}

impl CheckoutEngine {
    /// Create a checkout engine over shared ledger plumbing
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

    /// Run a batch checkout.
    ///
    /// Every row is evaluated against one ledger snapshot taken at the start
    /// of the call; the snapshot is not re-read mid-batch. A batch in which
    /// every row is skipped is still a success. A store failure after some
    /// valid rows committed fails the whole call with
    /// [`Error::PartialBatchFailure`]; committed rows remain in the ledger.
    pub async fn checkout(
        &self,
        rows: &[CheckoutRow],
        batch_key: &str,
        actor_email: &str,
    ) -> Result<CheckoutOutcome> {
        if rows.is_empty() {
            return Err(Error::Validation("no checkout rows supplied".to_string()));
        }

        let batch_key = batch_key.trim();
        if batch_key.is_empty() {
            return Err(Error::Validation(
                "batch idempotency key must not be empty".to_string(),
            ));
        }

        // Same duplicate check as single transactions, applied to the batch
        let used_keys = self.store.scan_column(Column::IdempotencyKey)?;
        if used_keys.iter().any(|key| key == batch_key) {
            return Err(Error::DuplicateTransaction {
                key: batch_key.to_string(),
            });
        }

        // One snapshot for every row in the batch
        let snapshot = self.store.scan_all()?;
        let distinct: Vec<String> = {
            let mut seen = HashMap::new();
            for row in rows {
                let trimmed = row.customer.trim();
                if !trimmed.is_empty() {
                    seen.entry(customer_key(trimmed)).or_insert_with(|| trimmed.to_string());
                }
            }
            seen.into_values().collect()
        };
        let balances = balance::batch_balances_of(&distinct, &snapshot);
        let mut current: HashMap<String, Decimal> = balances
            .into_iter()
            .map(|(name, bal)| (customer_key(&name), bal))
            .collect();

        let (valid, skipped) = partition_rows(rows, &mut current);

        tracing::info!(
            batch_key = %batch_key,
            valid = valid.len(),
            skipped = skipped.len(),
            "Batch checkout validated"
        );

        // All valid rows share one commit timestamp
        let committed_at = self.clock.next();

        if valid.is_empty() {
            self.metrics.record_checkout(0, skipped.len());
            return Ok(CheckoutOutcome {
                transaction_ids: Vec::new(),
                timestamp: committed_at,
                skipped,
            });
        }

        // Batch marker precedes the per-entry mirrors; best-effort
        if let Err(e) = self
            .sink
            .append_batch_marker(batch_key, committed_at, valid.len())
        {
            tracing::warn!(batch_key = %batch_key, error = %e, "Batch marker mirror failed");
        }

        let mut transaction_ids = Vec::with_capacity(valid.len());
        for row in &valid {
            let entry = LedgerEntry {
                timestamp: committed_at,
                transaction_id: Uuid::now_v7(),
                customer: row.customer.clone(),
                kind: EntryKind::Spend,
                amount: -row.amount,
                actor_email: actor_email.to_string(),
                note: row.note.clone(),
                idempotency_key: batch_key.to_string(),
            };

            match self.writer.append(entry.clone()).await {
                Ok(id) => {
                    transaction_ids.push(id);
                    if let Err(e) = self.sink.append_formatted_entry(&entry) {
                        tracing::warn!(
                            transaction_id = %id,
                            error = %e,
                            "Log mirror rejected committed batch row"
                        );
                    }
                }
                Err(e) => {
                    // No compensating rollback exists in an append-only model
                    tracing::error!(
                        batch_key = %batch_key,
                        committed = transaction_ids.len(),
                        row_index = row.index,
                        error = %e,
                        "Batch checkout aborted mid-commit"
                    );
                    return Err(Error::PartialBatchFailure {
                        committed: transaction_ids.len(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.metrics
            .record_checkout(transaction_ids.len(), skipped.len());

        tracing::info!(
            batch_key = %batch_key,
            committed = transaction_ids.len(),
            skipped = skipped.len(),
            "Batch checkout committed"
        );

        Ok(CheckoutOutcome {
            transaction_ids,
            timestamp: committed_at,
            skipped,
        })
    }
}

/// Walk rows in input order, drawing each valid row down from the customer's
/// remaining balance so later rows in the same batch see the cumulative
/// effect. `current` maps normalized customer names to remaining balances.
fn partition_rows(
    rows: &[CheckoutRow],
    current: &mut HashMap<String, Decimal>,
) -> (Vec<ValidRow>, Vec<SkippedRow>) {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for (position, row) in rows.iter().enumerate() {
        let index = position + 1;
        let customer = row.customer.trim();

        if customer.is_empty() {
            skipped.push(SkippedRow {
                index,
                customer: row.customer.clone(),
                reason: SkipReason::MissingCustomer,
            });
            continue;
        }

        if row.amount <= Decimal::ZERO {
            skipped.push(SkippedRow {
                index,
                customer: customer.to_string(),
                reason: SkipReason::InvalidAmount,
            });
            continue;
        }

        let key = customer_key(customer);
        let available = current.get(&key).copied().unwrap_or(Decimal::ZERO);
        if available < row.amount {
            skipped.push(SkippedRow {
                index,
                customer: customer.to_string(),
                reason: SkipReason::InsufficientBalance {
                    available,
                    requested: row.amount,
                },
            });
            continue;
        }

        current.insert(key, available - row.amount);
        valid.push(ValidRow {
            index,
            customer: customer.to_string(),
            amount: row.amount,
            note: row.note.clone(),
        });
    }

    (valid, skipped)
}
