//! Configuration loader
//!
//! Merges configuration from defaults, a TOML file, and prefixed
//! environment variables using figment. Later sources override earlier
//! ones.

use crate::config::AppConfig;
use crate::constants::{
    AES_GCM_KEY_SIZE, CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILENAME, JWT_SECRET_MIN_LENGTH,
};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};
use toolgate_domain::{Error, Result};
use tracing::{info, warn};

/// Configuration loader service
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later overrides earlier):
    /// 1. Default values from `AppConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables with the `TOOLGATE_` prefix, using `__` to
    ///    separate nesting levels (e.g. `TOOLGATE_SERVER__BIND_ADDR`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        let path = self.config_path.clone().or_else(Self::find_default_config_path);
        if let Some(path) = path {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
                info!("Configuration loaded from {}", path.display());
            } else {
                warn!("Configuration file not found: {}", path.display());
            }
        }

        figment = figment.merge(Env::prefixed(&format!("{CONFIG_ENV_PREFIX}_")).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("Failed to extract configuration: {e}")))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Find the default configuration file in the working directory
    fn find_default_config_path() -> Option<PathBuf> {
        let candidate = std::env::current_dir().ok()?.join(DEFAULT_CONFIG_FILENAME);
        candidate.exists().then_some(candidate)
    }
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<()> {
    if config.auth.enabled && config.auth.jwt_secret.len() < JWT_SECRET_MIN_LENGTH {
        return Err(Error::config(format!(
            "auth.jwt_secret must be at least {JWT_SECRET_MIN_LENGTH} bytes when auth is enabled"
        )));
    }

    if !config.settings.encryption_key.is_empty()
        && config.settings.encryption_key.len() != AES_GCM_KEY_SIZE
    {
        return Err(Error::config(format!(
            "settings.encryption_key must be exactly {AES_GCM_KEY_SIZE} bytes"
        )));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            return Err(Error::config("rate_limit.max_requests must be positive"));
        }
        if config.rate_limit.window_ms == 0 {
            return Err(Error::config("rate_limit.window_ms must be positive"));
        }
    }

    if config.auth.refresh_ttl_days <= 0 {
        return Err(Error::config("auth.refresh_ttl_days must be positive"));
    }

    config
        .server
        .bind_addr
        .parse::<std::net::SocketAddr>()
        .map_err(|e| Error::config(format!("server.bind_addr is invalid: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_defaults_require_jwt_secret() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_auth_disabled_skips_secret_check() {
        let mut config = AppConfig::default();
        config.auth.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bad_encryption_key_length_rejected() {
        let mut config = valid_config();
        config.settings.encryption_key = "short".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_bind_addr_rejected() {
        let mut config = valid_config();
        config.server.bind_addr = "not-an-addr".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[server]\nbind_addr = \"127.0.0.1:4242\"\n\n[auth]\njwt_secret = \"0123456789abcdef0123456789abcdef\"\n"
        )
        .expect("write config");

        let config = ConfigLoader::new()
            .with_config_path(file.path())
            .load()
            .expect("load config");
        assert_eq!(config.server.bind_addr, "127.0.0.1:4242");
        // untouched sections keep their defaults
        assert!(config.rate_limit.enabled);
    }
}
