//! Toolgate identity & access core
//!
//! The credential lifecycle (session tokens, rotating refresh tokens,
//! persistent API tokens), the permission evaluator that gates every
//! capability call, the sliding-window rate limiter, and the cross-cutting
//! infrastructure they share: configuration, logging, crypto, the
//! in-memory credential store, and the built-in tool host.
//!
//! # Module Structure
//!
//! - `auth` - password hashing, token issuing, refresh lifecycle,
//!   permissions, rate limiting
//! - `config` - figment-based layered configuration
//! - `crypto` - secret generation and settings encryption
//! - `exec` - typed CPU-offload pool
//! - `settings` - encrypted per-identity key/value settings
//! - `store` - in-memory `CredentialStore` implementation
//! - `tools` - static tool host with built-in capabilities

pub mod auth;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod exec;
pub mod logging;
pub mod settings;
pub mod store;
pub mod tools;

pub use auth::api_tokens::ApiTokenService;
pub use auth::permissions::{has_permission, AuthContext};
pub use auth::rate_limit::{RateDecision, SlidingWindowLimiter};
pub use auth::refresh::{RefreshTokenManager, RefreshVerification};
pub use auth::service::{AuthService, LoginOutcome};
pub use auth::session::{SessionClaims, SessionTokenIssuer};
pub use config::{AppConfig, ConfigLoader};
pub use settings::SettingsService;
pub use store::MemoryCredentialStore;
pub use tools::StaticToolHost;
