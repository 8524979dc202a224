//! Users store adapter
//!
//! Same shape as the ledger store adapter, different table: the gate only
//! ever scans all records. Registration and deactivation are out-of-band
//! operations owned by whoever operates the store.

use crate::{error::Result, types::UserRecord};
use parking_lot::RwLock;

/// Interface to the external users table
pub trait UsersStore: Send + Sync {
    /// Scan every user record
    fn scan_all(&self) -> Result<Vec<UserRecord>>;
}

/// In-memory users store, seeded at startup
#[derive(Debug, Default)]
pub struct MemoryUsers {
    records: RwLock<Vec<UserRecord>>,
}

impl MemoryUsers {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with records
    pub fn seeded(records: Vec<UserRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Register a user (registration itself is external to the gate)
    pub fn register(&self, record: UserRecord) {
        self.records.write().push(record);
    }

    /// Toggle the `active` flag of a user, by case-insensitive email match.
    /// Returns false when no record matches.
    pub fn set_active(&self, email: &str, active: bool) -> bool {
        let needle = email.trim().to_lowercase();
        let mut records = self.records.write();
        match records
            .iter_mut()
            .find(|r| r.email.trim().to_lowercase() == needle)
        {
            Some(record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }
}

impl UsersStore for MemoryUsers {
    fn scan_all(&self) -> Result<Vec<UserRecord>> {
        Ok(self.records.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn user(name: &str, email: &str, role: Role) -> UserRecord {
        UserRecord {
            name: name.to_string(),
            email: email.to_string(),
            role,
            active: true,
        }
    }

    #[test]
    fn register_and_scan() {
        let store = MemoryUsers::new();
        store.register(user("Dana", "dana@cashrail.example", Role::Cashier));
        store.register(user("Alice", "alice@customer.example", Role::Buyer));

        let records = store.scan_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Dana");
    }

    #[test]
    fn set_active_matches_case_insensitively() {
        let store = MemoryUsers::new();
        store.register(user("Dana", "Dana@CashRail.example", Role::Cashier));

        assert!(store.set_active("  dana@cashrail.EXAMPLE ", false));
        assert!(!store.scan_all().unwrap()[0].active);
        assert!(!store.set_active("nobody@cashrail.example", false));
    }
}
