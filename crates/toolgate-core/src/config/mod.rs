//! Configuration
//!
//! Layered configuration: defaults, then a TOML file, then environment
//! variables with the `TOOLGATE_` prefix. Loaded once at startup and
//! validated before the server is built.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, AuthConfig, LoggingConfig, RateLimitConfig, ServerConfig, SettingsConfig,
    ToolsConfig,
};
