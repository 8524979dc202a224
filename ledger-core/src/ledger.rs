//! Main ledger orchestration layer
//!
//! Ties together the store adapter, the single-writer append actor, the
//! commit clock, the log-sink mirror and the two engines into a high-level
//! API. Reads scan the store directly; writes go through the actor.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{Config, Ledger};
//!
//! #[tokio::main]
//! async fn main() -> ledger_core::Result<()> {
//!     let config = Config::default();
//!     let ledger = Ledger::open(config).await?;
//!
//!     let balance = ledger.balance_of("alice")?;
//!     println!("alice has {balance}");
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_append_actor, LedgerHandle},
    balance,
    checkout::CheckoutEngine,
    clock::CommitClock,
    error::{Error, Result},
    metrics::Metrics,
    mirror::{FileSink, LogSink, NullSink, TracingSink},
    recorder::TransactionRecorder,
    store::{Column, LedgerStore, RocksStore},
    types::{customer_key, CheckoutOutcome, CheckoutRow, LedgerEntry, Receipt, RecordRequest},
    Config,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Main ledger interface
pub struct Ledger {
    /// Direct store access (for reads)
    store: Arc<dyn LedgerStore>,

    /// Actor handle for writes
    writer: LedgerHandle,

    /// Single-transaction engine
    recorder: TransactionRecorder,

    /// Batch engine
    checkout: CheckoutEngine,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open a RocksDB-backed ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let store: Arc<dyn LedgerStore> = Arc::new(RocksStore::open(&config)?);

        let sink: Arc<dyn LogSink> = if !config.mirror.enabled {
            Arc::new(NullSink)
        } else if let Some(path) = &config.mirror.path {
            Arc::new(FileSink::open(path)?)
        } else {
            Arc::new(TracingSink)
        };

        Self::with_store(store, sink, config)
    }

    /// Assemble a ledger over explicit store and sink adapters.
    ///
    /// Must be called from within a tokio runtime; the writer actor is
    /// spawned here.
    pub fn with_store(
        store: Arc<dyn LedgerStore>,
        sink: Arc<dyn LogSink>,
        config: Config,
    ) -> Result<Self> {
        let metrics =
            Metrics::new().map_err(|e| Error::Other(format!("metrics init failed: {}", e)))?;
        let writer = spawn_append_actor(store.clone());
        let clock = Arc::new(CommitClock::new());

        let recorder = TransactionRecorder::new(
            store.clone(),
            writer.clone(),
            sink.clone(),
            clock.clone(),
            metrics.clone(),
        );
        let checkout = CheckoutEngine::new(
            store.clone(),
            writer.clone(),
            sink,
            clock,
            metrics.clone(),
        );

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            "Ledger assembled"
        );

        Ok(Self {
            store,
            writer,
            recorder,
            checkout,
            metrics,
            config,
        })
    }

    /// Validate and commit one top-up or spend
    pub async fn record(&self, request: RecordRequest) -> Result<Receipt> {
        self.recorder.record(request).await
    }

    /// Run a batch checkout under one batch idempotency key
    pub async fn checkout(
        &self,
        rows: &[CheckoutRow],
        batch_key: &str,
        actor_email: &str,
    ) -> Result<CheckoutOutcome> {
        self.checkout.checkout(rows, batch_key, actor_email).await
    }

    /// Derived balance of one customer
    pub fn balance_of(&self, customer: &str) -> Result<Decimal> {
        self.metrics.record_balance_query();
        let snapshot = self.store.scan_all()?;
        Ok(balance::balance_of(customer, &snapshot))
    }

    /// Derived balances for many customers against one shared snapshot
    pub fn batch_balances(&self, customers: &[String]) -> Result<HashMap<String, Decimal>> {
        self.metrics.record_balance_query();
        let snapshot = self.store.scan_all()?;
        Ok(balance::batch_balances_of(customers, &snapshot))
    }

    /// Most recent entries, newest first. `limit` is clamped to
    /// `1..=config.recent_limit_max`.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>> {
        let limit = limit.clamp(1, self.config.recent_limit_max);
        let mut entries = self.store.scan_all()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Distinct customer names seen in the ledger, first spelling wins,
    /// sorted case-insensitively
    pub fn customers(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut names: Vec<String> = self
            .store
            .scan_column(Column::Customer)?
            .into_iter()
            .filter_map(|name| {
                let trimmed = name.trim().to_string();
                seen.insert(customer_key(&trimmed)).then_some(trimmed)
            })
            .collect();
        names.sort_by_key(|name| customer_key(name));
        Ok(names)
    }

    /// Metrics collector (for scraping endpoints owned by the caller)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown the writer actor
    pub async fn shutdown(self) -> Result<()> {
        self.writer.shutdown().await
    }
}
