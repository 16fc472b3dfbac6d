//! Centralized constants for the identity & access core

/// Session (access) token lifetime in seconds - 15 minutes
pub const SESSION_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh-token lifetime in days
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Issuer claim embedded in session tokens
pub const SESSION_TOKEN_ISSUER: &str = "toolgate";

/// Minimum accepted signing-secret length in bytes
pub const JWT_SECRET_MIN_LENGTH: usize = 32;

/// Minimum accepted password length at sign-up
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// API-token secret prefix for identification
pub const API_TOKEN_PREFIX: &str = "mcp_";

/// Random bytes in an API-token secret (192 bits)
pub const API_TOKEN_SECRET_BYTES: usize = 24;

/// Random bytes in a refresh-token secret
pub const REFRESH_SECRET_BYTES: usize = 32;

/// AES-256-GCM key size in bytes
pub const AES_GCM_KEY_SIZE: usize = 32;

/// AES-GCM nonce size in bytes
pub const AES_GCM_NONCE_SIZE: usize = 12;

/// Default rate limit: maximum requests per window
pub const RATE_LIMIT_DEFAULT_MAX_REQUESTS: u32 = 1000;

/// Default rate limit: window length in milliseconds - 1 hour
pub const RATE_LIMIT_DEFAULT_WINDOW_MS: u64 = 3_600_000;

/// Interval between refresh-record sweeps in seconds - 5 minutes
pub const SWEEP_INTERVAL_SECS: u64 = 300;

/// Default capability execution timeout in seconds
pub const EXEC_TIMEOUT_DEFAULT_SECS: u64 = 30;

/// Default bound on concurrently offloaded CPU-bound tasks
pub const OFFLOAD_DEFAULT_CONCURRENCY: usize = 4;

/// Environment variable consulted for the log filter
pub const LOG_ENV_VAR: &str = "TOOLGATE_LOG";

/// Environment prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "TOOLGATE";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "toolgate.toml";
