//! Refresh-token lifecycle
//!
//! Refresh records rotate: using one issues a successor and retires the
//! predecessor. Secrets are stored only as salted Argon2id hashes, so
//! verification must scan every non-revoked record - the scan is the
//! price of not keeping an indexable form of the secret.
//!
//! Per-record state machine: `Active -> Active` (use), `-> Rotated`
//! (revoked, successor issued), `-> Revoked` (explicit or bulk), or
//! `-> Expired` (time). The three non-active states are terminal; a
//! periodic sweep deletes those records for good.

use crate::auth::password;
use crate::crypto::generate_refresh_secret;
use chrono::{Duration, Utc};
use std::sync::Arc;
use toolgate_domain::{CredentialStore, Error, RefreshTokenRecord, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// Successful refresh-token verification
#[derive(Debug, Clone)]
pub struct RefreshVerification {
    /// Owning identity id
    pub identity_id: String,
    /// Id of the matched record
    pub record_id: String,
}

/// Creates, verifies, rotates, and revokes refresh-token records
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn CredentialStore>,
    ttl_days: i64,
}

impl RefreshTokenManager {
    /// Create a new lifecycle manager
    pub fn new(store: Arc<dyn CredentialStore>, ttl_days: i64) -> Self {
        Self { store, ttl_days }
    }

    /// Create a refresh record for an identity
    ///
    /// Persists only the hash; the plaintext secret is returned once.
    pub async fn create(&self, identity_id: &str) -> Result<(RefreshTokenRecord, String)> {
        let secret = generate_refresh_secret();
        let secret_hash = password::hash_password(&secret)?;
        let now = Utc::now();

        let record = RefreshTokenRecord {
            id: Uuid::new_v4().to_string(),
            secret_hash,
            identity_id: identity_id.to_string(),
            expires_at: now + Duration::days(self.ttl_days),
            created_at: now,
            last_used_at: None,
            revoked: false,
        };

        self.store.insert_refresh_record(record.clone()).await?;
        debug!(identity = identity_id, record = %record.id, "Refresh record created");
        Ok((record, secret))
    }

    /// Verify a presented plaintext secret
    ///
    /// Checks the secret against every non-revoked record's hash. Returns
    /// `None` when nothing matches (fails closed). A match on an expired
    /// record is reported as `CredentialExpired` - distinguishable from
    /// "not found" so callers can prompt a re-login instead of retrying.
    pub async fn verify(&self, secret: &str) -> Result<Option<RefreshVerification>> {
        let now = Utc::now();
        for record in self.store.list_active_refresh_records().await? {
            if !password::verify_password(secret, &record.secret_hash)? {
                continue;
            }

            if record.is_expired(now) {
                return Err(Error::credential_expired("Refresh token expired"));
            }

            self.store.touch_refresh_record(&record.id, now).await?;
            return Ok(Some(RefreshVerification {
                identity_id: record.identity_id,
                record_id: record.id,
            }));
        }
        Ok(None)
    }

    /// Atomically claim a record for rotation
    ///
    /// Marks the record revoked; `true` means this caller won the claim.
    /// Of two concurrent rotations of the same record, exactly one sees
    /// `true` - the other must fail as "already rotated".
    pub async fn claim_for_rotation(&self, record_id: &str) -> Result<bool> {
        self.store.revoke_refresh_record(record_id).await
    }

    /// Revoke every refresh record owned by an identity
    ///
    /// Used on password reset or security events.
    pub async fn revoke_all(&self, identity_id: &str) -> Result<u64> {
        let revoked = self.store.revoke_all_refresh_records(identity_id).await?;
        if revoked > 0 {
            info!(identity = identity_id, revoked, "Revoked all refresh records");
        }
        Ok(revoked)
    }

    /// Permanently delete expired or revoked records
    pub async fn sweep(&self) -> Result<u64> {
        let removed = self.store.delete_expired_or_revoked(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "Swept refresh records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    fn manager() -> RefreshTokenManager {
        RefreshTokenManager::new(Arc::new(MemoryCredentialStore::new()), 30)
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let manager = manager();
        let (record, secret) = manager.create("user-1").await.expect("create");

        // stored form is a hash, not the secret
        assert_ne!(record.secret_hash, secret);
        assert!(record.secret_hash.starts_with("$argon2"));

        let verification = manager
            .verify(&secret)
            .await
            .expect("verify")
            .expect("should match");
        assert_eq!(verification.identity_id, "user-1");
        assert_eq!(verification.record_id, record.id);
    }

    #[tokio::test]
    async fn test_unknown_secret_fails_closed() {
        let manager = manager();
        manager.create("user-1").await.expect("create");
        assert!(manager.verify("bogus").await.expect("verify").is_none());
    }

    #[tokio::test]
    async fn test_expired_record_is_distinguished() {
        let manager = RefreshTokenManager::new(Arc::new(MemoryCredentialStore::new()), -1);
        let (_, secret) = manager.create("user-1").await.expect("create");

        let err = manager.verify(&secret).await.expect_err("must be expired");
        assert!(matches!(err, Error::CredentialExpired { .. }));
    }

    #[tokio::test]
    async fn test_claim_is_single_winner() {
        let manager = manager();
        let (record, _) = manager.create("user-1").await.expect("create");

        assert!(manager.claim_for_rotation(&record.id).await.expect("claim"));
        // second claim loses
        assert!(!manager.claim_for_rotation(&record.id).await.expect("claim"));
    }

    #[tokio::test]
    async fn test_revoked_record_no_longer_verifies() {
        let manager = manager();
        let (record, secret) = manager.create("user-1").await.expect("create");
        manager.claim_for_rotation(&record.id).await.expect("claim");

        assert!(manager.verify(&secret).await.expect("verify").is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_and_sweep() {
        let manager = manager();
        let (_, secret_a) = manager.create("user-1").await.expect("create");
        let (_, secret_b) = manager.create("user-1").await.expect("create");
        let (_, other) = manager.create("user-2").await.expect("create");

        assert_eq!(manager.revoke_all("user-1").await.expect("revoke"), 2);
        assert!(manager.verify(&secret_a).await.expect("verify").is_none());
        assert!(manager.verify(&secret_b).await.expect("verify").is_none());
        // other identity unaffected
        assert!(manager.verify(&other).await.expect("verify").is_some());

        assert_eq!(manager.sweep().await.expect("sweep"), 2);
    }
}
