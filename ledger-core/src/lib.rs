//! CashRail Ledger Core
//!
//! Append-only cash ledger with derived balances and overdraft-safe batch
//! checkout.
//!
//! # Architecture
//!
//! - **Append-only**: every top-up and spend is an immutable row; balances
//!   are always recomputed from history, never cached authoritatively
//! - **Single Writer**: all appends are serialized through one writer task
//! - **Idempotency**: every write carries a key checked against the full
//!   ledger history, so retries can never double-count
//! - **Best-effort mirror**: committed rows are copied to a log sink; a sink
//!   failure never rolls back the ledger write

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod balance;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod mirror;
pub mod recorder;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use types::{
    CheckoutOutcome, CheckoutRow, EntryKind, LedgerEntry, Receipt, RecordRequest, SkipReason,
    SkippedRow,
};
