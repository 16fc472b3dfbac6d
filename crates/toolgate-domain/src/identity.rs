//! Identity records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account (human or service)
///
/// The id is immutable; the login name is unique across the gateway.
/// Deleting an identity cascades to every token and setting it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Immutable unique id
    pub id: String,
    /// Unique login name
    pub login: String,
    /// Human-readable display name
    pub display_name: String,
    /// Hashed login secret (never serialized)
    #[serde(skip)]
    pub password_hash: String,
    /// When the identity was created
    pub created_at: DateTime<Utc>,
    /// Administrator flag - grants unrestricted capability access
    pub is_admin: bool,
}

impl Identity {
    /// Create a new non-admin identity with a generated id
    pub fn new(login: String, display_name: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            login,
            display_name,
            password_hash,
            created_at: Utc::now(),
            is_admin: false,
        }
    }

    /// Create a new administrator identity with a generated id
    pub fn new_admin(login: String, display_name: String, password_hash: String) -> Self {
        let mut identity = Self::new(login, display_name, password_hash);
        identity.is_admin = true;
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_is_not_admin() {
        let identity = Identity::new("alice".into(), "Alice".into(), "hash".into());
        assert!(!identity.is_admin);
        assert_eq!(identity.login, "alice");
        assert!(!identity.id.is_empty());
    }

    #[test]
    fn test_admin_identity() {
        let identity = Identity::new_admin("root".into(), "Root".into(), "hash".into());
        assert!(identity.is_admin);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Identity::new("a".into(), "A".into(), "h".into());
        let b = Identity::new("b".into(), "B".into(), "h".into());
        assert_ne!(a.id, b.id);
    }
}
