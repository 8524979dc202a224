//! CashRail Access Control
//!
//! Resolves verified emails to user records and decides whether a role may
//! perform a requested action class. The gate is a pure read over the users
//! store; identity verification itself (credential exchange, login) happens
//! upstream and is out of scope.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod gate;
pub mod store;
pub mod types;

// Re-exports
pub use error::{Error, Result};
pub use gate::Gate;
pub use store::{MemoryUsers, UsersStore};
pub use types::{Role, UserRecord, READ_ROLES, STAFF_READ_ROLES, WRITE_ROLES};
