//! Toolgate binary
//!
//! Loads configuration, wires the collaborators, bootstraps the
//! administrator identity, and serves.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toolgate_core::exec::OffloadPool;
use toolgate_core::{logging, ConfigLoader, MemoryCredentialStore, StaticToolHost};
use toolgate_server::{run, AppState};

/// Multi-tenant gateway for user-owned tools
#[derive(Parser)]
#[command(name = "toolgate", version, about)]
struct Args {
    /// Path to the configuration file (defaults to ./toolgate.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load()?;
    if let Some(listen) = args.listen {
        config.server.bind_addr = listen;
    }

    logging::init_logging(&config.logging)?;

    let store = Arc::new(MemoryCredentialStore::new());
    let tool_host = Arc::new(StaticToolHost::with_builtins(OffloadPool::new(
        config.tools.offload_concurrency,
    )));

    let state = AppState::new(config, store, tool_host)?;
    state.bootstrap().await?;

    run(state).await
}
