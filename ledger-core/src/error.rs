//! Error types for the ledger

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input, rejected before any store access
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Idempotency key already present anywhere in the ledger
    #[error("Duplicate transaction: idempotency key {key:?} already used")]
    DuplicateTransaction {
        /// The offending idempotency key
        key: String,
    },

    /// A spend would drive the customer balance below zero
    #[error("Insufficient balance for {customer:?}: {balance} available, {requested} requested")]
    InsufficientBalance {
        /// Customer the spend was addressed to
        customer: String,
        /// Current derived balance
        balance: Decimal,
        /// Requested deduction magnitude
        requested: Decimal,
    },

    /// A batch append failed after some valid rows were already committed
    #[error("Batch checkout failed after committing {committed} row(s): {reason}")]
    PartialBatchFailure {
        /// Number of valid rows committed before the failure
        committed: usize,
        /// Underlying store failure
        reason: String,
    },

    /// Log-sink mirroring failed after a successful ledger append.
    /// The ledger write is NOT rolled back; the ledger is the source of truth.
    #[error("Transaction {transaction_id} committed but log mirror failed: {reason}")]
    MirrorFailed {
        /// Id of the entry that was committed despite the mirror failure
        transaction_id: Uuid,
        /// Underlying sink failure
        reason: String,
    },

    /// Storage error (RocksDB or adapter-level row corruption)
    #[error("Storage error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Concurrency error (writer mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl Error {
    /// True for expected, caller-facing outcomes that carry enough structure
    /// for the caller to react without inspecting server logs.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::DuplicateTransaction { .. }
                | Error::InsufficientBalance { .. }
        )
    }
}
