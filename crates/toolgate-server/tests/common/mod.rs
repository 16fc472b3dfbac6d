//! Shared fixtures for the integration suites

use std::sync::Arc;
use toolgate_core::exec::OffloadPool;
use toolgate_core::{AppConfig, MemoryCredentialStore, StaticToolHost};
use toolgate_server::AppState;

/// A test configuration with auth enabled and everything else default
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-signing-secret!!!".to_string();
    config.settings.encryption_key = "0123456789abcdef0123456789abcdef".to_string();
    config
}

/// Build an application state over fresh in-memory collaborators
pub fn test_state(config: AppConfig) -> Arc<AppState> {
    let store = Arc::new(MemoryCredentialStore::new());
    let tool_host = Arc::new(StaticToolHost::with_builtins(OffloadPool::new(2)));
    AppState::new(config, store, tool_host).expect("state should build")
}
