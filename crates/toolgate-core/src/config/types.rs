//! Configuration section types

use crate::constants::{
    EXEC_TIMEOUT_DEFAULT_SECS, OFFLOAD_DEFAULT_CONCURRENCY, RATE_LIMIT_DEFAULT_MAX_REQUESTS,
    RATE_LIMIT_DEFAULT_WINDOW_MS, REFRESH_TOKEN_TTL_DAYS, SESSION_TOKEN_TTL_SECS,
};
use serde::{Deserialize, Serialize};
use toolgate_domain::RateLimitSpec;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server/transport configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Rate-limit configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Per-identity settings encryption
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Capability execution configuration
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server/transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (HTTP, WebSocket, and SSE share it)
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable authentication; when disabled every request is anonymous
    pub enabled: bool,

    /// Session-token signing secret
    ///
    /// **REQUIRED** when authentication is enabled. Configure via
    /// `TOOLGATE_AUTH__JWT_SECRET` or `auth.jwt_secret` in the config file.
    /// Must be at least 32 bytes.
    pub jwt_secret: String,

    /// Session-token lifetime in seconds
    pub session_ttl_secs: u64,

    /// Refresh-token lifetime in days
    pub refresh_ttl_days: i64,

    /// Bootstrap administrator login name (first run only)
    #[serde(default)]
    pub bootstrap_login: Option<String>,

    /// Bootstrap administrator password (first run only)
    #[serde(default)]
    pub bootstrap_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Empty by default - must be configured when auth is enabled
            jwt_secret: String::new(),
            session_ttl_secs: SESSION_TOKEN_TTL_SECS,
            refresh_ttl_days: REFRESH_TOKEN_TTL_DAYS,
            bootstrap_login: None,
            bootstrap_password: None,
        }
    }
}

/// Rate-limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting; when disabled every check passes with no
    /// bookkeeping
    pub enabled: bool,
    /// Default maximum requests per window
    pub max_requests: u32,
    /// Default window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: RATE_LIMIT_DEFAULT_MAX_REQUESTS,
            window_ms: RATE_LIMIT_DEFAULT_WINDOW_MS,
        }
    }
}

impl RateLimitConfig {
    /// The default per-credential limit spec derived from this config
    pub fn default_spec(&self) -> RateLimitSpec {
        RateLimitSpec {
            max_requests: self.max_requests,
            window_ms: self.window_ms,
        }
    }
}

/// Per-identity settings encryption configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// 32-byte key for AES-256-GCM encryption of setting values
    ///
    /// Configure via `TOOLGATE_SETTINGS__ENCRYPTION_KEY`. Required if any
    /// identity stores settings.
    pub encryption_key: String,
}

/// Capability execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound on a single capability invocation, in seconds
    pub exec_timeout_secs: u64,
    /// Bound on concurrently offloaded CPU-bound tasks
    pub offload_concurrency: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            exec_timeout_secs: EXEC_TIMEOUT_DEFAULT_SECS,
            offload_concurrency: OFFLOAD_DEFAULT_CONCURRENCY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON-formatted log lines
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}
