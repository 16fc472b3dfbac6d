//! Persistent scoped API tokens
//!
//! The plaintext secret doubles as the record's lookup key: creation
//! returns it exactly once and the store holds it verbatim, giving O(1)
//! verification at the cost of secret-at-rest exposure. Absence on lookup
//! is not an error - it simply means "unauthenticated".

use crate::crypto::generate_api_token_secret;
use chrono::Utc;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use toolgate_domain::{ApiTokenRecord, CredentialStore, Error, RateLimitSpec, Result};
use tracing::debug;

/// Manages the persistent API-token credential type
#[derive(Clone)]
pub struct ApiTokenService {
    store: Arc<dyn CredentialStore>,
}

impl ApiTokenService {
    /// Create a new API-token service
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Create a new token for an identity
    ///
    /// The returned record carries the plaintext secret; this is the only
    /// time the caller can read it from an API response, even though the
    /// store keeps it verbatim.
    pub async fn create(
        &self,
        identity_id: &str,
        name: &str,
        permissions: Option<Vec<String>>,
        expires_in_days: Option<i64>,
        rate_limit: Option<RateLimitSpec>,
    ) -> Result<ApiTokenRecord> {
        if name.trim().is_empty() {
            return Err(Error::invalid_argument("Token name must not be empty"));
        }

        let now = Utc::now();
        let record = ApiTokenRecord {
            secret: generate_api_token_secret(),
            identity_id: identity_id.to_string(),
            name: name.to_string(),
            permissions,
            created_at: now,
            expires_at: expires_in_days.map(|days| now + chrono::Duration::days(days)),
            last_used_at: None,
            rate_limit,
        };

        self.store.insert_api_token(record.clone()).await?;
        debug!(identity = identity_id, token = %record.name, "API token created");
        Ok(record)
    }

    /// Verify a presented secret
    ///
    /// Returns `None` for unknown or expired secrets; a hit bumps the
    /// record's last-used time as a side effect.
    pub async fn verify(&self, secret: &str) -> Result<Option<ApiTokenRecord>> {
        let Some(record) = self.store.api_token_by_secret(secret).await? else {
            return Ok(None);
        };

        // The store looked the record up by key; compare the stored secret
        // against the presented one in constant time anyway.
        let matches: bool = record.secret.as_bytes().ct_eq(secret.as_bytes()).into();
        if !matches {
            return Ok(None);
        }

        let now = Utc::now();
        if record.is_expired(now) {
            return Ok(None);
        }

        self.store.touch_api_token(secret, now).await?;
        Ok(Some(record))
    }

    /// List the tokens owned by an identity
    pub async fn list(&self, identity_id: &str) -> Result<Vec<ApiTokenRecord>> {
        self.store.list_api_tokens(identity_id).await
    }

    /// Delete a token
    ///
    /// Only the owner or an administrator may delete a token; the record's
    /// existence is not revealed to anyone else.
    pub async fn revoke(
        &self,
        secret: &str,
        requester_id: &str,
        requester_is_admin: bool,
    ) -> Result<bool> {
        let Some(record) = self.store.api_token_by_secret(secret).await? else {
            return Ok(false);
        };
        if record.identity_id != requester_id && !requester_is_admin {
            return Err(Error::permission_denied("Not the token owner"));
        }
        self.store.delete_api_token(secret).await
    }
}
