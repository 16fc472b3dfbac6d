//! Per-identity encrypted settings
//!
//! Key/value settings owned by an identity, encrypted at rest with the
//! configured master key. The decrypted map doubles as the environment
//! merged into every capability invocation the identity makes.

use crate::crypto::SettingsCipher;
use std::collections::HashMap;
use std::sync::Arc;
use toolgate_domain::{CredentialStore, Error, Result};
use tracing::warn;

/// Encrypted per-identity key/value settings
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn CredentialStore>,
    cipher: SettingsCipher,
}

impl SettingsService {
    /// Create a new settings service
    pub fn new(store: Arc<dyn CredentialStore>, cipher: SettingsCipher) -> Self {
        Self { store, cipher }
    }

    /// Store a setting value, encrypting it first
    pub async fn set(&self, identity_id: &str, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::invalid_argument("Setting key must not be empty"));
        }
        let stored = self.cipher.encrypt(value)?;
        self.store.put_setting(identity_id, key, stored).await
    }

    /// Fetch and decrypt a setting value
    pub async fn get(&self, identity_id: &str, key: &str) -> Result<Option<String>> {
        match self.store.get_setting(identity_id, key).await? {
            Some(stored) => Ok(Some(self.cipher.decrypt(&stored)?)),
            None => Ok(None),
        }
    }

    /// Delete a setting; returns `false` if absent
    pub async fn delete(&self, identity_id: &str, key: &str) -> Result<bool> {
        self.store.delete_setting(identity_id, key).await
    }

    /// List setting keys for an identity (values stay encrypted at rest)
    pub async fn keys(&self, identity_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_settings(identity_id)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// The decrypted environment map for capability invocations
    ///
    /// Values that fail to decrypt (e.g. after a key change) are skipped
    /// rather than failing the whole invocation.
    pub async fn environment(&self, identity_id: &str) -> Result<HashMap<String, String>> {
        let mut env = HashMap::new();
        for (key, stored) in self.store.list_settings(identity_id).await? {
            match self.cipher.decrypt(&stored) {
                Ok(value) => {
                    env.insert(key, value);
                }
                Err(_) => {
                    warn!(identity = identity_id, key, "Skipping undecryptable setting");
                }
            }
        }
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    fn service() -> SettingsService {
        SettingsService::new(
            Arc::new(MemoryCredentialStore::new()),
            SettingsCipher::new(b"0123456789abcdef0123456789abcdef").expect("cipher"),
        )
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let service = service();
        service.set("u1", "API_KEY", "hunter2").await.expect("set");
        assert_eq!(
            service.get("u1", "API_KEY").await.expect("get").as_deref(),
            Some("hunter2")
        );
    }

    #[tokio::test]
    async fn test_values_encrypted_at_rest() {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = SettingsService::new(
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            SettingsCipher::new(b"0123456789abcdef0123456789abcdef").expect("cipher"),
        );
        service.set("u1", "API_KEY", "hunter2").await.expect("set");

        let raw = store.get_setting("u1", "API_KEY").await.expect("raw");
        assert_ne!(raw.expect("present"), "hunter2");
    }

    #[tokio::test]
    async fn test_environment_merges_all_settings() {
        let service = service();
        service.set("u1", "A", "1").await.expect("set");
        service.set("u1", "B", "2").await.expect("set");
        service.set("u2", "C", "3").await.expect("set");

        let env = service.environment("u1").await.expect("env");
        assert_eq!(env.len(), 2);
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert!(!env.contains_key("C"));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        service.set("u1", "A", "1").await.expect("set");
        assert!(service.delete("u1", "A").await.expect("delete"));
        assert!(!service.delete("u1", "A").await.expect("delete"));
        assert!(service.get("u1", "A").await.expect("get").is_none());
    }
}
