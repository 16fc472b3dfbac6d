//! Session-token claim set
//!
//! Session tokens are stateless: the signed claim set is the whole
//! credential. Validity is solely a function of signature and expiry.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Claim set carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity id)
    pub sub: String,
    /// Administrator flag
    pub admin: bool,
    /// Issued-at timestamp (unix seconds)
    pub iat: u64,
    /// Expiration timestamp (unix seconds)
    pub exp: u64,
    /// Issuer
    pub iss: String,
}

impl SessionClaims {
    /// Create new claims for an identity
    pub fn new(identity_id: String, admin: bool, issuer: String, ttl_secs: u64) -> Self {
        let now = unix_now();
        Self {
            sub: identity_id,
            admin,
            iat: now,
            exp: now + ttl_secs,
            iss: issuer,
        }
    }

    /// Check if the claims have expired
    pub fn is_expired(&self) -> bool {
        self.exp < unix_now()
    }

    /// Remaining validity in seconds (0 if expired)
    pub fn remaining_secs(&self) -> u64 {
        self.exp.saturating_sub(unix_now())
    }
}

/// Current unix time in seconds
fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = SessionClaims::new("user123".to_string(), false, "toolgate".to_string(), 900);

        assert_eq!(claims.sub, "user123");
        assert!(!claims.admin);
        assert!(!claims.is_expired());
        assert!(claims.remaining_secs() > 800);
    }

    #[test]
    fn test_expired_claims() {
        let mut claims = SessionClaims::new("u".to_string(), true, "toolgate".to_string(), 900);
        claims.exp = claims.iat.saturating_sub(10);
        assert!(claims.is_expired());
        assert_eq!(claims.remaining_secs(), 0);
    }
}
