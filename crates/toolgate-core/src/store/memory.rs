//! In-memory credential store
//!
//! A `RwLock`-guarded implementation of the `CredentialStore` port. It is
//! never the sole record of a credential's existence in a deployment with
//! a durable store behind it, and it can be rebuilt at any time; here it
//! doubles as the reference implementation the test suites run against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use toolgate_domain::{
    ApiTokenRecord, CredentialStore, Error, Identity, RefreshTokenRecord, Result, StoreStats,
};

#[derive(Default)]
struct Inner {
    /// Identities keyed by id
    identities: HashMap<String, Identity>,
    /// API tokens keyed by their plaintext secret
    api_tokens: HashMap<String, ApiTokenRecord>,
    /// Refresh records keyed by record id
    refresh_records: HashMap<String, RefreshTokenRecord>,
    /// Settings keyed by (identity id, key)
    settings: HashMap<(String, String), String>,
}

/// In-memory `CredentialStore` implementation
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::storage("Store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::storage("Store lock poisoned"))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn identity_by_login(&self, login: &str) -> Result<Option<Identity>> {
        Ok(self
            .read()?
            .identities
            .values()
            .find(|i| i.login == login)
            .cloned())
    }

    async fn identity_by_id(&self, id: &str) -> Result<Option<Identity>> {
        Ok(self.read()?.identities.get(id).cloned())
    }

    async fn list_identities(&self) -> Result<Vec<Identity>> {
        let mut identities: Vec<_> = self.read()?.identities.values().cloned().collect();
        identities.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(identities)
    }

    async fn insert_identity(&self, identity: Identity) -> Result<()> {
        let mut inner = self.write()?;
        if inner.identities.values().any(|i| i.login == identity.login) {
            return Err(Error::invalid_argument(format!(
                "Login name already taken: {}",
                identity.login
            )));
        }
        if inner.identities.contains_key(&identity.id) {
            return Err(Error::storage(format!("Duplicate identity id: {}", identity.id)));
        }
        inner.identities.insert(identity.id.clone(), identity);
        Ok(())
    }

    async fn delete_identity(&self, id: &str) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.identities.remove(id).is_none() {
            return Ok(false);
        }
        // cascade: tokens and settings owned by the identity go with it
        inner.api_tokens.retain(|_, t| t.identity_id != id);
        inner.refresh_records.retain(|_, r| r.identity_id != id);
        inner.settings.retain(|(owner, _), _| owner != id);
        Ok(true)
    }

    async fn admin_exists(&self) -> Result<bool> {
        Ok(self.read()?.identities.values().any(|i| i.is_admin))
    }

    async fn insert_api_token(&self, record: ApiTokenRecord) -> Result<()> {
        let mut inner = self.write()?;
        if inner.api_tokens.contains_key(&record.secret) {
            return Err(Error::storage("Duplicate API-token secret"));
        }
        inner.api_tokens.insert(record.secret.clone(), record);
        Ok(())
    }

    async fn api_token_by_secret(&self, secret: &str) -> Result<Option<ApiTokenRecord>> {
        Ok(self.read()?.api_tokens.get(secret).cloned())
    }

    async fn list_api_tokens(&self, identity_id: &str) -> Result<Vec<ApiTokenRecord>> {
        let mut tokens: Vec<_> = self
            .read()?
            .api_tokens
            .values()
            .filter(|t| t.identity_id == identity_id)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tokens)
    }

    async fn delete_api_token(&self, secret: &str) -> Result<bool> {
        Ok(self.write()?.api_tokens.remove(secret).is_some())
    }

    async fn touch_api_token(&self, secret: &str, when: DateTime<Utc>) -> Result<()> {
        if let Some(record) = self.write()?.api_tokens.get_mut(secret) {
            record.last_used_at = Some(when);
        }
        Ok(())
    }

    async fn delete_expired_api_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.write()?;
        let before = inner.api_tokens.len();
        inner.api_tokens.retain(|_, t| !t.is_expired(now));
        Ok((before - inner.api_tokens.len()) as u64)
    }

    async fn insert_refresh_record(&self, record: RefreshTokenRecord) -> Result<()> {
        let mut inner = self.write()?;
        if inner.refresh_records.contains_key(&record.id) {
            return Err(Error::storage(format!("Duplicate refresh record id: {}", record.id)));
        }
        inner.refresh_records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_active_refresh_records(&self) -> Result<Vec<RefreshTokenRecord>> {
        Ok(self
            .read()?
            .refresh_records
            .values()
            .filter(|r| !r.revoked)
            .cloned()
            .collect())
    }

    async fn touch_refresh_record(&self, id: &str, when: DateTime<Utc>) -> Result<()> {
        if let Some(record) = self.write()?.refresh_records.get_mut(id) {
            record.last_used_at = Some(when);
        }
        Ok(())
    }

    async fn revoke_refresh_record(&self, id: &str) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.refresh_records.get_mut(id) {
            // conditional update: the claim succeeds at most once per record
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_refresh_records(&self, identity_id: &str) -> Result<u64> {
        let mut inner = self.write()?;
        let mut revoked = 0;
        for record in inner.refresh_records.values_mut() {
            if record.identity_id == identity_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete_expired_or_revoked(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.write()?;
        let before = inner.refresh_records.len();
        inner
            .refresh_records
            .retain(|_, r| !r.revoked && !r.is_expired(now));
        Ok((before - inner.refresh_records.len()) as u64)
    }

    async fn get_setting(&self, identity_id: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .read()?
            .settings
            .get(&(identity_id.to_string(), key.to_string()))
            .cloned())
    }

    async fn put_setting(&self, identity_id: &str, key: &str, value: String) -> Result<()> {
        self.write()?
            .settings
            .insert((identity_id.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn delete_setting(&self, identity_id: &str, key: &str) -> Result<bool> {
        Ok(self
            .write()?
            .settings
            .remove(&(identity_id.to_string(), key.to_string()))
            .is_some())
    }

    async fn list_settings(&self, identity_id: &str) -> Result<Vec<(String, String)>> {
        let mut settings: Vec<_> = self
            .read()?
            .settings
            .iter()
            .filter(|((owner, _), _)| owner == identity_id)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect();
        settings.sort();
        Ok(settings)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.read()?;
        Ok(StoreStats {
            identities: inner.identities.len() as u64,
            api_tokens: inner.api_tokens.len() as u64,
            active_refresh_records: inner
                .refresh_records
                .values()
                .filter(|r| !r.revoked)
                .count() as u64,
        })
    }
}
