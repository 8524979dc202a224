//! Metrics collection for observability
//!
//! Prometheus metrics for the ledger engines.
//!
//! # Metrics
//!
//! - `cashrail_entries_total{kind}` - Committed ledger entries by kind
//! - `cashrail_checkout_batches_total` - Batch checkouts that ran to completion
//! - `cashrail_checkout_rows_skipped_total` - Batch rows skipped with a reason
//! - `cashrail_balance_queries_total` - Balance reads served
//! - `cashrail_append_duration_seconds` - Append latency histogram

use crate::types::EntryKind;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed entries, labeled by kind
    pub entries_total: IntCounterVec,

    /// Completed batch checkouts
    pub checkout_batches_total: IntCounter,

    /// Skipped batch rows
    pub checkout_rows_skipped_total: IntCounter,

    /// Balance reads
    pub balance_queries_total: IntCounter,

    /// Append latency histogram
    pub append_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry.
    ///
    /// Metrics are registered against the owned registry rather than the
    /// process-global one, so constructing several collectors (tests, several
    /// ledgers in one process) cannot collide.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let entries_total = IntCounterVec::new(
            Opts::new("cashrail_entries_total", "Committed ledger entries"),
            &["kind"],
        )?;
        registry.register(Box::new(entries_total.clone()))?;

        let checkout_batches_total = IntCounter::with_opts(Opts::new(
            "cashrail_checkout_batches_total",
            "Batch checkouts that ran to completion",
        ))?;
        registry.register(Box::new(checkout_batches_total.clone()))?;

        let checkout_rows_skipped_total = IntCounter::with_opts(Opts::new(
            "cashrail_checkout_rows_skipped_total",
            "Batch rows skipped with a reason",
        ))?;
        registry.register(Box::new(checkout_rows_skipped_total.clone()))?;

        let balance_queries_total = IntCounter::with_opts(Opts::new(
            "cashrail_balance_queries_total",
            "Balance reads served",
        ))?;
        registry.register(Box::new(balance_queries_total.clone()))?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new(
                "cashrail_append_duration_seconds",
                "Histogram of append latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        Ok(Self {
            entries_total,
            checkout_batches_total,
            checkout_rows_skipped_total,
            balance_queries_total,
            append_duration,
            registry,
        })
    }

    /// Record one committed entry
    pub fn record_entry(&self, kind: EntryKind) {
        self.entries_total.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record a completed batch checkout
    pub fn record_checkout(&self, committed: usize, skipped: usize) {
        self.checkout_batches_total.inc();
        self.checkout_rows_skipped_total.inc_by(skipped as u64);
        self.entries_total
            .with_label_values(&[EntryKind::Spend.as_str()])
            .inc_by(committed as u64);
    }

    /// Record a balance read
    pub fn record_balance_query(&self) {
        self.balance_queries_total.inc();
    }

    /// Record append latency
    pub fn record_append_duration(&self, duration_seconds: f64) {
        self.append_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
