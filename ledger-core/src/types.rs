//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode for storage, camelCase JSON on the
//!   wire, decimal amounts as strings)
//! - Exact arithmetic (Decimal for money)
//! - Case- and whitespace-insensitive customer matching

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Normalized form of a customer name, used for all balance matching.
///
/// Two names refer to the same customer iff their normalized forms are equal.
pub fn customer_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Kind of a ledger entry. Always server-assigned, never trusted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Deposit; signed amount is positive
    #[serde(rename = "TOPUP")]
    TopUp,
    /// Deduction; signed amount is negative
    #[serde(rename = "SPEND")]
    Spend,
}

impl EntryKind {
    /// Wire/log name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::TopUp => "TOPUP",
            EntryKind::Spend => "SPEND",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable ledger row.
///
/// Committed exclusively by the transaction recorder and the batch checkout
/// engine; never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Server-assigned commit instant, monotonic per process
    pub timestamp: DateTime<Utc>,

    /// Server-generated id (UUIDv7 for time-ordering), never reused
    pub transaction_id: Uuid,

    /// Customer the entry applies to, stored trimmed
    pub customer: String,

    /// TOPUP or SPEND
    pub kind: EntryKind,

    /// Signed amount: positive for TOPUP, negative for SPEND, never zero
    pub amount: Decimal,

    /// Verified identity of the submitting user
    pub actor_email: String,

    /// Free text, may be empty
    pub note: String,

    /// Caller-supplied key; unique across the ledger for single transactions,
    /// shared by all rows of one batch
    pub idempotency_key: String,
}

impl LedgerEntry {
    /// Normalized customer name for balance matching
    pub fn customer_key(&self) -> String {
        customer_key(&self.customer)
    }
}

/// Input to the transaction recorder. `amount` is the positive magnitude;
/// the recorder derives the signed amount from `kind`.
#[derive(Debug, Clone)]
pub struct RecordRequest {
    /// Customer the transaction applies to
    pub customer: String,
    /// TOPUP or SPEND
    pub kind: EntryKind,
    /// Positive magnitude
    pub amount: Decimal,
    /// Free text, may be empty
    pub note: String,
    /// Caller-supplied idempotency key
    pub idempotency_key: String,
    /// Verified identity of the submitting user
    pub actor_email: String,
}

/// What the recorder hands back for a committed transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Server-generated transaction id
    pub transaction_id: Uuid,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// One proposed deduction within a batch checkout
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRow {
    /// Customer to charge
    pub customer: String,
    /// Positive deduction magnitude
    pub amount: Decimal,
    /// Free text, may be empty
    #[serde(default)]
    pub note: String,
}

/// Why a batch row was skipped rather than committed
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Row had an empty customer name
    MissingCustomer,
    /// Row amount was not a positive number
    InvalidAmount,
    /// Remaining balance after earlier rows in the batch could not cover it
    InsufficientBalance {
        /// Balance still available to this customer within the batch
        available: Decimal,
        /// Deduction the row asked for
        requested: Decimal,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingCustomer => write!(f, "missing customer name"),
            SkipReason::InvalidAmount => write!(f, "invalid amount"),
            SkipReason::InsufficientBalance {
                available,
                requested,
            } => write!(f, "insufficient balance: {available} < {requested}"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A batch row that was not committed, with its original input position
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// 1-based index into the submitted row list
    pub index: usize,
    /// Customer name as submitted
    pub customer: String,
    /// Why the row was skipped
    pub reason: SkipReason,
}

/// Result of a batch checkout. A batch where every row was skipped is still
/// a success: zero committed, full skip list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    /// Ids of committed SPEND entries, in input order
    pub transaction_ids: Vec<Uuid>,
    /// Shared commit timestamp of every committed row
    pub timestamp: DateTime<Utc>,
    /// Rows that were not committed, with reasons
    pub skipped: Vec<SkippedRow>,
}

impl CheckoutOutcome {
    /// Number of committed rows
    pub fn transaction_count(&self) -> usize {
        self.transaction_ids.len()
    }

    /// Number of skipped rows
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}
