//! Ledger store adapters
//!
//! The external tabular store is modeled by the [`LedgerStore`] trait: append
//! a row, scan all rows, scan a single column. The store offers no
//! transaction primitive, so idempotency-key existence checks are column
//! scans performed by the engines before any write.
//!
//! # Column Families (RocksDB adapter)
//!
//! - `entries` - Append-only row log (key: big-endian sequence number)
//! - `idem_index` - Idempotency-key existence index (key: idempotency key)

use crate::{
    error::{Error, Result},
    types::LedgerEntry,
    Config,
};
use parking_lot::RwLock;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Column family names
const CF_ENTRIES: &str = "entries";
const CF_IDEM_INDEX: &str = "idem_index";

/// Ledger column addressed by [`LedgerStore::scan_column`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// The idempotency-key column (duplicate-write checks)
    IdempotencyKey,
    /// The customer column (distinct-customer listings)
    Customer,
}

/// Interface to the external append-only tabular store.
///
/// Rows are never mutated or removed; `scan_all` returns them in append
/// order. Rows that fail to decode are a store-level error, never silently
/// coerced.
pub trait LedgerStore: Send + Sync {
    /// Append one committed row
    fn append_row(&self, entry: &LedgerEntry) -> Result<()>;

    /// Scan every row, in append order
    fn scan_all(&self) -> Result<Vec<LedgerEntry>>;

    /// Scan one column across every row
    fn scan_column(&self, column: Column) -> Result<Vec<String>>;
}

/// RocksDB-backed ledger store
pub struct RocksStore {
    db: Arc<DB>,
    next_seq: AtomicU64,
}

impl RocksStore {
    /// Open or create the database under `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-only workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ENTRIES, Self::cf_options_entries()),
            ColumnFamilyDescriptor::new(CF_IDEM_INDEX, Self::cf_options_idem_index()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        let db = Arc::new(db);

        let next_seq = Self::recover_next_seq(&db)?;

        tracing::info!(
            path = %path.display(),
            next_seq,
            "Opened RocksDB ledger store"
        );

        Ok(Self {
            db,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    fn cf_options_entries() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_idem_index() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Existence checks benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Store(format!("Column family {} not found", name)))
    }

    /// Sequence numbering continues across reopens: next = last key + 1
    fn recover_next_seq(db: &DB) -> Result<u64> {
        let cf = db
            .cf_handle(CF_ENTRIES)
            .ok_or_else(|| Error::Store(format!("Column family {} not found", CF_ENTRIES)))?;

        match db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                let bytes: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| Error::Store("corrupt entries key".to_string()))?;
                Ok(u64::from_be_bytes(bytes) + 1)
            }
            None => Ok(0),
        }
    }
}

impl LedgerStore for RocksStore {
    fn append_row(&self, entry: &LedgerEntry) -> Result<()> {
        let cf_entries = self.cf_handle(CF_ENTRIES)?;
        let cf_index = self.cf_handle(CF_IDEM_INDEX)?;

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let value = bincode::serialize(entry)?;

        // Row and index land together or not at all
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_entries, seq.to_be_bytes(), &value);
        batch.put_cf(
            cf_index,
            entry.idempotency_key.as_bytes(),
            entry.transaction_id.to_string().as_bytes(),
        );
        self.db.write(batch)?;

        tracing::debug!(
            transaction_id = %entry.transaction_id,
            customer = %entry.customer,
            kind = %entry.kind,
            seq,
            "Ledger row appended"
        );

        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<LedgerEntry>> {
        let cf = self.cf_handle(CF_ENTRIES)?;

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let entry: LedgerEntry = bincode::deserialize(&value)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    fn scan_column(&self, column: Column) -> Result<Vec<String>> {
        match column {
            Column::IdempotencyKey => {
                let cf = self.cf_handle(CF_IDEM_INDEX)?;

                let mut keys = Vec::new();
                for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                    let (key, _) = item?;
                    let key = String::from_utf8(key.to_vec())
                        .map_err(|_| Error::Store("non-UTF-8 idempotency key".to_string()))?;
                    keys.push(key);
                }
                Ok(keys)
            }
            Column::Customer => Ok(self
                .scan_all()?
                .into_iter()
                .map(|entry| entry.customer)
                .collect()),
        }
    }
}

/// In-memory ledger store.
///
/// Stand-in for the external tabular store in tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<LedgerEntry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows appended so far
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True if no rows have been appended
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl LedgerStore for MemoryStore {
    fn append_row(&self, entry: &LedgerEntry) -> Result<()> {
        self.rows.write().push(entry.clone());
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.rows.read().clone())
    }

    fn scan_column(&self, column: Column) -> Result<Vec<String>> {
        let rows = self.rows.read();
        Ok(rows
            .iter()
            .map(|entry| match column {
                Column::IdempotencyKey => entry.idempotency_key.clone(),
                Column::Customer => entry.customer.clone(),
            })
            .collect())
    }
}
