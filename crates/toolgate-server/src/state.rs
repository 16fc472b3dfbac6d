//! Shared application state
//!
//! All per-process mutable state - the store, the rate-limiter windows,
//! the SSE subscriber channel - lives here, constructed at startup and
//! passed by `Arc` into the transports. Nothing is global.

use crate::rpc::{CredentialResolver, Dispatcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use toolgate_core::constants::SESSION_TOKEN_ISSUER;
use toolgate_core::crypto::{generate_hex_secret, SettingsCipher};
use toolgate_core::{
    ApiTokenService, AppConfig, AuthService, RefreshTokenManager, SessionTokenIssuer,
    SettingsService, SlidingWindowLimiter,
};
use toolgate_domain::{CredentialStore, Result, ToolHost};

/// Shared state handed to every transport and route
pub struct AppState {
    /// Loaded configuration
    pub config: AppConfig,
    /// The credential store collaborator
    pub store: Arc<dyn CredentialStore>,
    /// Authentication facade
    pub auth: AuthService,
    /// Sliding-window rate limiter
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Tool-loading collaborator
    pub tool_host: Arc<dyn ToolHost>,
    /// Encrypted settings service (absent when no key is configured)
    pub settings: Option<SettingsService>,
    /// The protocol dispatcher
    pub dispatcher: Dispatcher,
    /// Broadcast channel feeding SSE subscribers
    pub sse_tx: broadcast::Sender<String>,
}

impl AppState {
    /// Build the state graph from configuration and the two collaborators
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        tool_host: Arc<dyn ToolHost>,
    ) -> Result<Arc<Self>> {
        // With auth disabled no secret is configured; the issuer still
        // needs one, so mint a throwaway for the process lifetime.
        let signing_secret = if config.auth.jwt_secret.is_empty() {
            generate_hex_secret(32)
        } else {
            config.auth.jwt_secret.clone()
        };
        let sessions = SessionTokenIssuer::new(
            &signing_secret,
            config.auth.session_ttl_secs,
            SESSION_TOKEN_ISSUER.to_string(),
        )?;

        let refresh = RefreshTokenManager::new(Arc::clone(&store), config.auth.refresh_ttl_days);
        let api_tokens = ApiTokenService::new(Arc::clone(&store));
        let auth = AuthService::new(
            Arc::clone(&store),
            sessions,
            refresh,
            api_tokens,
            config.auth.enabled,
        );

        let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit.enabled));

        let settings = if config.settings.encryption_key.is_empty() {
            None
        } else {
            let cipher = SettingsCipher::new(config.settings.encryption_key.as_bytes())?;
            Some(SettingsService::new(Arc::clone(&store), cipher))
        };

        let dispatcher = Dispatcher::new(
            CredentialResolver::new(auth.clone()),
            Arc::clone(&limiter),
            Arc::clone(&tool_host),
            settings.clone(),
            config.rate_limit.default_spec(),
            Duration::from_secs(config.tools.exec_timeout_secs),
        );

        let (sse_tx, _) = broadcast::channel(256);

        Ok(Arc::new(Self {
            config,
            store,
            auth,
            limiter,
            tool_host,
            settings,
            dispatcher,
            sse_tx,
        }))
    }

    /// First-run bootstrap: create the administrator identity if needed
    pub async fn bootstrap(&self) -> Result<()> {
        self.auth
            .bootstrap_admin(
                self.config.auth.bootstrap_login.as_deref(),
                self.config.auth.bootstrap_password.as_deref(),
            )
            .await?;
        Ok(())
    }
}
