//! User records and roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a user, determining permitted action classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Staff operating the till: all writes and reads
    Cashier,
    /// Administrators: all writes and reads
    Admin,
    /// Read-only staff
    Viewer,
    /// Customers: may only query their own balance
    Buyer,
}

impl Role {
    /// Wire/log name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cashier => "cashier",
            Role::Admin => "admin",
            Role::Viewer => "viewer",
            Role::Buyer => "buyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Roles permitted to perform write actions (top-up, spend, batch checkout)
pub const WRITE_ROLES: &[Role] = &[Role::Cashier, Role::Admin];

/// Roles permitted to perform read actions
pub const READ_ROLES: &[Role] = &[Role::Cashier, Role::Admin, Role::Viewer, Role::Buyer];

/// Roles permitted to read across all customers (recent entries, listings).
/// Buyers are scoped to their own balance and excluded here.
pub const STAFF_READ_ROLES: &[Role] = &[Role::Cashier, Role::Admin, Role::Viewer];

/// One user record in the users store.
///
/// Created by registration (external to the gate) and never deleted;
/// `active` is the only mutable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Display name, matched against customer names for self-service lookups
    pub name: String,
    /// Unique key, compared case-insensitively
    pub email: String,
    /// Permitted action classes
    pub role: Role,
    /// Deactivated accounts are rejected regardless of role
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_sets() {
        assert!(WRITE_ROLES.contains(&Role::Cashier));
        assert!(WRITE_ROLES.contains(&Role::Admin));
        assert!(!WRITE_ROLES.contains(&Role::Viewer));
        assert!(!WRITE_ROLES.contains(&Role::Buyer));

        assert!(READ_ROLES.contains(&Role::Buyer));
        assert!(!STAFF_READ_ROLES.contains(&Role::Buyer));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Cashier).unwrap(), "\"cashier\"");
        let role: Role = serde_json::from_str("\"buyer\"").unwrap();
        assert_eq!(role, Role::Buyer);
    }
}
