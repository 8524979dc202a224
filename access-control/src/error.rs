//! Error types for access control

use crate::types::Role;
use thiserror::Error;

/// Result type for access-control operations
pub type Result<T> = std::result::Result<T, Error>;

/// Authorization denials and store failures
#[derive(Error, Debug)]
pub enum Error {
    /// No user record matches the email
    #[error("Authorization denied: no user record for {0:?}")]
    NotFound(String),

    /// The matching record is deactivated
    #[error("Authorization denied: account {0:?} is deactivated")]
    Deactivated(String),

    /// The record's role is not in the required set
    #[error("Authorization denied: role {role} of {email:?} may not perform this action")]
    InsufficientRole {
        /// Email of the denied user
        email: String,
        /// Their actual role
        role: Role,
    },

    /// Users store failure
    #[error("Users store error: {0}")]
    Store(String),
}

impl Error {
    /// True for denials (as opposed to store failures)
    pub fn is_denial(&self) -> bool {
        !matches!(self, Error::Store(_))
    }
}
