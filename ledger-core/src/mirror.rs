//! Human-readable log mirroring
//!
//! Every committed transaction is copied to a write-only log sink. The sink
//! is an external collaborator and strictly best-effort: it fires only after
//! a successful ledger append, and a sink failure never rolls back the
//! ledger write.

use crate::{error::Result, types::LedgerEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Write-only sink receiving formatted copies of committed transactions.
pub trait LogSink: Send + Sync {
    /// Mirror one committed ledger entry
    fn append_formatted_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Mirror a batch-level marker, written before the batch's entries
    fn append_batch_marker(
        &self,
        batch_key: &str,
        timestamp: DateTime<Utc>,
        row_count: usize,
    ) -> Result<()>;
}

/// Appends one JSON line per mirrored record to a file.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the mirror file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, line: &str) -> Result<()> {
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}

impl LogSink for FileSink {
    fn append_formatted_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| crate::Error::Other(format!("mirror encode: {}", e)))?;
        self.write_line(&line)
    }

    fn append_batch_marker(
        &self,
        batch_key: &str,
        timestamp: DateTime<Utc>,
        row_count: usize,
    ) -> Result<()> {
        let line = serde_json::to_string(&serde_json::json!({
            "marker": "batch",
            "batchKey": batch_key,
            "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            "rowCount": row_count,
        }))
        .map_err(|e| crate::Error::Other(format!("mirror encode: {}", e)))?;
        self.write_line(&line)
    }
}

/// Mirrors records into the tracing pipeline under the `cashrail_audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append_formatted_entry(&self, entry: &LedgerEntry) -> Result<()> {
        tracing::info!(
            target: "cashrail_audit",
            transaction_id = %entry.transaction_id,
            customer = %entry.customer,
            kind = %entry.kind,
            amount = %entry.amount,
            actor = %entry.actor_email,
            note = %entry.note,
            idempotency_key = %entry.idempotency_key,
            "ledger entry"
        );
        Ok(())
    }

    fn append_batch_marker(
        &self,
        batch_key: &str,
        timestamp: DateTime<Utc>,
        row_count: usize,
    ) -> Result<()> {
        tracing::info!(
            target: "cashrail_audit",
            batch_key = %batch_key,
            timestamp = %timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            row_count,
            "batch checkout"
        );
        Ok(())
    }
}

/// Discards everything. Used when mirroring is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn append_formatted_entry(&self, _entry: &LedgerEntry) -> Result<()> {
        Ok(())
    }

    fn append_batch_marker(
        &self,
        _batch_key: &str,
        _timestamp: DateTime<Utc>,
        _row_count: usize,
    ) -> Result<()> {
        Ok(())
    }
}
