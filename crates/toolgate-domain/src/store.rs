//! Credential store port
//!
//! The durable record store is an external collaborator consumed through
//! this CRUD contract. It holds no business logic: expiry, revocation, and
//! permission decisions all happen in the core on top of these operations.
//! The one semantic requirement is that `revoke_refresh_record` is an
//! atomic claim - of two concurrent callers, exactly one sees `true`.

use crate::error::Result;
use crate::identity::Identity;
use crate::token::{ApiTokenRecord, RefreshTokenRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate record counts, reported by the health endpoint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of identities
    pub identities: u64,
    /// Number of API-token records
    pub api_tokens: u64,
    /// Number of non-revoked refresh records
    pub active_refresh_records: u64,
}

/// Durable, keyed lookup/insert/delete for credential records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // --- Identities ---

    /// Look up an identity by its unique login name
    async fn identity_by_login(&self, login: &str) -> Result<Option<Identity>>;

    /// Look up an identity by id
    async fn identity_by_id(&self, id: &str) -> Result<Option<Identity>>;

    /// List every identity
    async fn list_identities(&self) -> Result<Vec<Identity>>;

    /// Insert a new identity; fails if the login name is taken
    async fn insert_identity(&self, identity: Identity) -> Result<()>;

    /// Delete an identity, cascading to its tokens and settings
    ///
    /// Returns `false` if no such identity existed.
    async fn delete_identity(&self, id: &str) -> Result<bool>;

    /// Whether any administrator identity exists
    async fn admin_exists(&self) -> Result<bool>;

    // --- API tokens ---

    /// Insert a new API-token record; fails on duplicate secret
    async fn insert_api_token(&self, record: ApiTokenRecord) -> Result<()>;

    /// Exact-match lookup by the plaintext secret
    async fn api_token_by_secret(&self, secret: &str) -> Result<Option<ApiTokenRecord>>;

    /// List the API tokens owned by an identity
    async fn list_api_tokens(&self, identity_id: &str) -> Result<Vec<ApiTokenRecord>>;

    /// Delete an API token by secret; returns `false` if absent
    async fn delete_api_token(&self, secret: &str) -> Result<bool>;

    /// Update an API token's last-used time
    async fn touch_api_token(&self, secret: &str, when: DateTime<Utc>) -> Result<()>;

    /// Delete API tokens whose expiry has passed; returns the count removed
    async fn delete_expired_api_tokens(&self, now: DateTime<Utc>) -> Result<u64>;

    // --- Refresh records ---

    /// Insert a new refresh-token record
    async fn insert_refresh_record(&self, record: RefreshTokenRecord) -> Result<()>;

    /// List every non-revoked refresh record (expired ones included, so the
    /// caller can distinguish "expired" from "not found")
    async fn list_active_refresh_records(&self) -> Result<Vec<RefreshTokenRecord>>;

    /// Update a refresh record's last-used time
    async fn touch_refresh_record(&self, id: &str, when: DateTime<Utc>) -> Result<()>;

    /// Atomically mark a refresh record revoked
    ///
    /// Returns `true` only if the record existed and was not already
    /// revoked - the conditional update that serializes rotation.
    async fn revoke_refresh_record(&self, id: &str) -> Result<bool>;

    /// Mark every refresh record owned by an identity revoked
    async fn revoke_all_refresh_records(&self, identity_id: &str) -> Result<u64>;

    /// Permanently delete expired or revoked refresh records
    async fn delete_expired_or_revoked(&self, now: DateTime<Utc>) -> Result<u64>;

    // --- Per-identity settings ---

    /// Fetch a setting value (stored form) for an identity
    async fn get_setting(&self, identity_id: &str, key: &str) -> Result<Option<String>>;

    /// Insert or replace a setting value (stored form)
    async fn put_setting(&self, identity_id: &str, key: &str, value: String) -> Result<()>;

    /// Delete a setting; returns `false` if absent
    async fn delete_setting(&self, identity_id: &str, key: &str) -> Result<bool>;

    /// List all settings for an identity as (key, stored value) pairs
    async fn list_settings(&self, identity_id: &str) -> Result<Vec<(String, String)>>;

    // --- Stats ---

    /// Aggregate record counts
    async fn stats(&self) -> Result<StoreStats>;
}
