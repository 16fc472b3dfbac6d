//! Structured logging with tracing
//!
//! Configures the tracing subscriber once at startup: env-filter driven
//! levels (overridable via `TOOLGATE_LOG`) and optional JSON output.

use crate::config::LoggingConfig;
use crate::constants::LOG_ENV_VAR;
use toolgate_domain::{Error, Result};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initialize logging with the provided configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(&config.level));

    // The layer types differ between the two formats, so separate branches
    if config.json_format {
        let stdout = fmt::layer().json().with_target(true);
        Registry::default().with(filter).with(stdout).init();
    } else {
        let stdout = fmt::layer().with_target(true);
        Registry::default().with(filter).with(stdout).init();
    }

    info!("Logging initialized with level: {}", level);
    Ok(())
}

/// Parse a log level string to a tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::config(format!(
            "Invalid log level: {level}. Use trace, debug, info, warn, or error"
        ))),
    }
}
