//! Credential records: API tokens and refresh tokens
//!
//! Two of the three credential kinds are durable records defined here. The
//! third - the short-lived session token - is stateless and never stored;
//! its claim set lives with the issuer in the core crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permission-scope element granting access to every capability
pub const WILDCARD_SCOPE: &str = "*";

/// Per-credential rate-limit specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSpec {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitSpec {
    fn default() -> Self {
        // 1000 requests per hour
        Self {
            max_requests: 1000,
            window_ms: 3_600_000,
        }
    }
}

/// Persistent scoped API token
///
/// The plaintext secret is itself the lookup key - stored verbatim, never
/// hashed. O(1) lookup traded against secret-at-rest exposure; callers get
/// the secret exactly once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTokenRecord {
    /// The plaintext secret (primary key)
    pub secret: String,
    /// Owning identity id
    pub identity_id: String,
    /// Friendly name chosen by the owner
    pub name: String,
    /// Permission scope: capability names or the wildcard element.
    /// `None` means full access to the owning identity's own capabilities.
    pub permissions: Option<Vec<String>>,
    /// When the token was created
    pub created_at: DateTime<Utc>,
    /// Optional absolute expiry (None = never)
    pub expires_at: Option<DateTime<Utc>>,
    /// When the token was last used to authenticate
    pub last_used_at: Option<DateTime<Utc>>,
    /// Optional per-token rate limit overriding the configured default
    pub rate_limit: Option<RateLimitSpec>,
}

impl ApiTokenRecord {
    /// Check whether the token has passed its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

/// Rotating long-lived refresh-token record
///
/// Only the one-way hash of the secret is stored. `Rotated`, `Revoked`,
/// and `Expired` are terminal: a record is never re-activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Generated record id
    pub id: String,
    /// One-way hash of the secret (never serialized)
    #[serde(skip)]
    pub secret_hash: String,
    /// Owning identity id
    pub identity_id: String,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last used
    pub last_used_at: Option<DateTime<Utc>>,
    /// Whether the record has been revoked (rotation or explicit revoke)
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// Check whether the record has passed its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Check whether the record can still be trusted
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn refresh_record(expires_in: Duration, revoked: bool) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id: "r1".into(),
            secret_hash: "hash".into(),
            identity_id: "u1".into(),
            expires_at: now + expires_in,
            created_at: now,
            last_used_at: None,
            revoked,
        }
    }

    #[test]
    fn test_refresh_record_valid() {
        let record = refresh_record(Duration::days(30), false);
        assert!(record.is_valid(Utc::now()));
    }

    #[test]
    fn test_refresh_record_expired() {
        let record = refresh_record(Duration::seconds(-1), false);
        let now = Utc::now();
        assert!(record.is_expired(now));
        assert!(!record.is_valid(now));
    }

    #[test]
    fn test_refresh_record_revoked_is_invalid() {
        let record = refresh_record(Duration::days(30), true);
        assert!(!record.is_valid(Utc::now()));
    }

    #[test]
    fn test_api_token_never_expires_by_default() {
        let token = ApiTokenRecord {
            secret: "mcp_abc".into(),
            identity_id: "u1".into(),
            name: "ci".into(),
            permissions: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
            rate_limit: None,
        };
        assert!(!token.is_expired(Utc::now()));
    }
}
