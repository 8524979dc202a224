//! Authorization gate
//!
//! Pure read: resolves a verified email to a user record and checks the
//! record's role against the required set. The buyer self-scope rule (a
//! buyer may only query their own balance) is enforced by callers, not here.

use crate::{
    error::{Error, Result},
    store::UsersStore,
    types::{Role, UserRecord},
};
use std::sync::Arc;

/// Decides whether a verified identity may perform an action class
pub struct Gate {
    store: Arc<dyn UsersStore>,
}

impl Gate {
    /// Create a gate over a users store
    pub fn new(store: Arc<dyn UsersStore>) -> Self {
        Self { store }
    }

    /// Authorize `email` against a required role set.
    ///
    /// Lookup is by case-insensitive, trimmed email. Returns the matching
    /// record on success so callers can apply identity-scoped rules.
    pub fn authorize(&self, email: &str, required: &[Role]) -> Result<UserRecord> {
        let needle = email.trim().to_lowercase();

        let records = self.store.scan_all()?;
        let user = records
            .into_iter()
            .find(|record| record.email.trim().to_lowercase() == needle)
            .ok_or_else(|| Error::NotFound(email.trim().to_string()))?;

        if !user.active {
            tracing::info!(email = %user.email, "Denied: deactivated account");
            return Err(Error::Deactivated(user.email));
        }

        if !required.contains(&user.role) {
            tracing::info!(email = %user.email, role = %user.role, "Denied: insufficient role");
            return Err(Error::InsufficientRole {
                email: user.email,
                role: user.role,
            });
        }

        Ok(user)
    }
}
