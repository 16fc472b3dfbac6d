//! Authentication service facade
//!
//! Ties password verification, session-token issuing, and the
//! refresh-token lifecycle together into the flows the transports call:
//! login, rotation, sign-up, credential verification, bootstrap, and the
//! cascade teardown when an identity is deleted.

use crate::auth::api_tokens::ApiTokenService;
use crate::auth::password;
use crate::auth::permissions::AuthContext;
use crate::auth::refresh::RefreshTokenManager;
use crate::auth::session::SessionTokenIssuer;
use crate::constants::PASSWORD_MIN_LENGTH;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use toolgate_domain::{CredentialStore, Error, Identity, Result};
use tracing::{info, warn};

/// Result of a successful login or rotation
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Signed session token
    pub access_token: String,
    /// Session-token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Plaintext refresh secret - returned once, never stored
    pub refresh_token: String,
    /// Refresh-record expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// The authenticated identity
    pub identity: Identity,
}

/// Authentication facade over the store and the token services
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionTokenIssuer,
    refresh: RefreshTokenManager,
    api_tokens: ApiTokenService,
    enabled: bool,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: SessionTokenIssuer,
        refresh: RefreshTokenManager,
        api_tokens: ApiTokenService,
        enabled: bool,
    ) -> Self {
        Self {
            store,
            sessions,
            refresh,
            api_tokens,
            enabled,
        }
    }

    /// Whether authentication is enforced
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The API-token service
    pub fn api_tokens(&self) -> &ApiTokenService {
        &self.api_tokens
    }

    /// The refresh-token lifecycle manager
    pub fn refresh(&self) -> &RefreshTokenManager {
        &self.refresh
    }

    /// Authenticate with login name and password
    ///
    /// On success issues a session token and a fresh refresh token. The
    /// failure message never reveals whether the login name exists.
    pub async fn login(&self, login: &str, password_input: &str) -> Result<LoginOutcome> {
        let identity = self
            .store
            .identity_by_login(login)
            .await?
            .ok_or_else(|| Error::unauthenticated("Invalid credentials"))?;

        if !password::verify_password(password_input, &identity.password_hash)? {
            return Err(Error::unauthenticated("Invalid credentials"));
        }

        self.issue_pair(identity).await
    }

    /// Rotate a refresh token
    ///
    /// Verifies the presented secret, atomically claims the matched record,
    /// and issues a new session token plus a successor refresh token. A
    /// secret that was already rotated - including one racing a concurrent
    /// rotation - fails; exactly one rotation of a record ever succeeds.
    pub async fn rotate(&self, refresh_secret: &str) -> Result<LoginOutcome> {
        let verification = self
            .refresh
            .verify(refresh_secret)
            .await?
            .ok_or_else(|| Error::unauthenticated("Invalid refresh token"))?;

        // Claim the predecessor before issuing anything: of two concurrent
        // rotations only the claim winner proceeds.
        if !self.refresh.claim_for_rotation(&verification.record_id).await? {
            return Err(Error::unauthenticated("Refresh token already rotated"));
        }

        let identity = self
            .store
            .identity_by_id(&verification.identity_id)
            .await?
            .ok_or_else(|| Error::unauthenticated("Invalid refresh token"))?;

        self.issue_pair(identity).await
    }

    async fn issue_pair(&self, identity: Identity) -> Result<LoginOutcome> {
        let (access_token, access_expires_at) =
            self.sessions.issue(&identity.id, identity.is_admin)?;
        let (record, refresh_token) = self.refresh.create(&identity.id).await?;

        Ok(LoginOutcome {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at: record.expires_at,
            identity,
        })
    }

    /// Register a new identity
    pub async fn register(
        &self,
        login: &str,
        password_input: &str,
        display_name: &str,
    ) -> Result<Identity> {
        if login.is_empty() || !login.chars().all(|c| c.is_alphanumeric() || "-_".contains(c)) {
            return Err(Error::invalid_argument(
                "Login name may contain only alphanumerics, '-' and '_'",
            ));
        }
        if password_input.len() < PASSWORD_MIN_LENGTH {
            return Err(Error::invalid_argument(format!(
                "Password must be at least {PASSWORD_MIN_LENGTH} characters"
            )));
        }

        let display = if display_name.is_empty() {
            login
        } else {
            display_name
        };
        let identity = Identity::new(
            login.to_string(),
            display.to_string(),
            password::hash_password(password_input)?,
        );
        self.store.insert_identity(identity.clone()).await?;
        info!(login, "Identity registered");
        Ok(identity)
    }

    /// Create the bootstrap administrator if none exists
    ///
    /// On first run, when no administrator identity is present and
    /// bootstrap credentials are configured, creates exactly one admin.
    pub async fn bootstrap_admin(
        &self,
        login: Option<&str>,
        password_input: Option<&str>,
    ) -> Result<Option<Identity>> {
        if self.store.admin_exists().await? {
            return Ok(None);
        }
        let (Some(login), Some(password_input)) = (login, password_input) else {
            if self.enabled {
                warn!("No administrator identity exists and no bootstrap credentials configured");
            }
            return Ok(None);
        };

        let identity = Identity::new_admin(
            login.to_string(),
            login.to_string(),
            password::hash_password(password_input)?,
        );
        self.store.insert_identity(identity.clone()).await?;
        info!(login, "Bootstrap administrator created");
        Ok(Some(identity))
    }

    /// Delete an identity, cascading to its tokens and settings
    pub async fn delete_identity(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_identity(id).await?;
        if deleted {
            info!(identity = id, "Identity deleted");
        }
        Ok(deleted)
    }

    /// Build the caller context for a verified session token
    pub fn context_from_session(&self, token: &str) -> Result<AuthContext> {
        let claims = self.sessions.verify(token)?;
        Ok(AuthContext::for_session(claims.sub, claims.admin))
    }

    /// Build the caller context for an API-token secret
    ///
    /// `None` means the secret is unknown or expired - unauthenticated,
    /// not an error.
    pub async fn context_from_api_token(&self, secret: &str) -> Result<Option<AuthContext>> {
        let Some(record) = self.api_tokens.verify(secret).await? else {
            return Ok(None);
        };
        let is_admin = self
            .store
            .identity_by_id(&record.identity_id)
            .await?
            .is_some_and(|identity| identity.is_admin);

        Ok(Some(AuthContext::for_api_token(
            record.identity_id,
            is_admin,
            record.permissions,
            &record.secret,
            record.rate_limit,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;

    const SECRET: &str = "an-adequately-long-signing-secret!!";

    fn service() -> AuthService {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        AuthService::new(
            Arc::clone(&store),
            SessionTokenIssuer::new(SECRET, 900, "toolgate".to_string()).expect("issuer"),
            RefreshTokenManager::new(Arc::clone(&store), 30),
            ApiTokenService::new(store),
            true,
        )
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let service = service();
        let registered = service
            .register("alice", "correct-horse", "Alice")
            .await
            .expect("register");

        let outcome = service.login("alice", "correct-horse").await.expect("login");
        assert_eq!(outcome.identity.id, registered.id);

        // the session token verifies and carries the identity id
        let ctx = service
            .context_from_session(&outcome.access_token)
            .expect("context");
        assert_eq!(ctx.identity_id, registered.id);
        assert!(!ctx.is_admin);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let service = service();
        service
            .register("alice", "correct-horse", "Alice")
            .await
            .expect("register");

        let err = service.login("alice", "battery-staple").await.expect_err("wrong pw");
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_unknown_login_same_error_shape() {
        let service = service();
        let err = service.login("nobody", "pw-whatever").await.expect_err("unknown");
        // no user enumeration via error text
        assert_eq!(err.to_string(), "Unauthenticated: Invalid credentials");
    }

    #[tokio::test]
    async fn test_rotation_succeeds_once() {
        let service = service();
        service
            .register("alice", "correct-horse", "Alice")
            .await
            .expect("register");
        let outcome = service.login("alice", "correct-horse").await.expect("login");

        let rotated = service.rotate(&outcome.refresh_token).await.expect("rotate");
        assert_ne!(rotated.refresh_token, outcome.refresh_token);

        // the rotated-away secret is dead
        let err = service
            .rotate(&outcome.refresh_token)
            .await
            .expect_err("reuse must fail");
        assert!(matches!(err, Error::Unauthenticated { .. }));

        // the successor still works
        service.rotate(&rotated.refresh_token).await.expect("successor rotates");
    }

    #[tokio::test]
    async fn test_concurrent_rotation_single_winner() {
        let service = service();
        service
            .register("alice", "correct-horse", "Alice")
            .await
            .expect("register");
        let outcome = service.login("alice", "correct-horse").await.expect("login");

        let secret = outcome.refresh_token.clone();
        let (a, b) = tokio::join!(service.rotate(&secret), service.rotate(secret.as_str()));
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1, "exactly one concurrent rotation may win");
    }

    #[tokio::test]
    async fn test_bootstrap_creates_exactly_one_admin() {
        let service = service();
        let created = service
            .bootstrap_admin(Some("root"), Some("root-password"))
            .await
            .expect("bootstrap");
        assert!(created.is_some());

        // second run is a no-op
        let again = service
            .bootstrap_admin(Some("root2"), Some("root-password"))
            .await
            .expect("bootstrap");
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();
        assert!(service.register("bad login", "long-enough", "X").await.is_err());
        assert!(service.register("ok-login", "short", "X").await.is_err());
        assert!(service.register("ok-login", "long-enough", "X").await.is_ok());
        // duplicate login
        assert!(service.register("ok-login", "long-enough", "X").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_identity_kills_all_tokens() {
        let service = service();
        let identity = service
            .register("alice", "correct-horse", "Alice")
            .await
            .expect("register");
        let outcome = service.login("alice", "correct-horse").await.expect("login");
        let api = service
            .api_tokens()
            .create(&identity.id, "ci", None, None, None)
            .await
            .expect("token");

        assert!(service.delete_identity(&identity.id).await.expect("delete"));

        // former API token: gone, not expired
        assert!(service
            .api_tokens()
            .verify(&api.secret)
            .await
            .expect("verify")
            .is_none());
        // former refresh token: "not found", not "expired"
        let err = service
            .rotate(&outcome.refresh_token)
            .await
            .expect_err("refresh gone");
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }
}
