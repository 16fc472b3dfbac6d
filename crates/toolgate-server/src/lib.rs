//! Toolgate server
//!
//! The protocol layer and transports over the identity & access core:
//! JSON-RPC envelopes and the staged dispatcher, the axum HTTP router,
//! WebSocket and SSE transports, and the REST management surface.

pub mod routes;
pub mod rpc;
pub mod state;
pub mod transport;

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use toolgate_core::constants::SWEEP_INTERVAL_SECS;
use toolgate_domain::CredentialStore;
use tracing::{info, warn};

pub use state::AppState;

/// Serve the router until shutdown
///
/// Binds the configured address, spawns the background sweeper, and runs
/// until SIGINT/SIGTERM.
pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
    let bind_addr: std::net::SocketAddr = state.config.server.bind_addr.parse()?;
    let router = transport::build_router(Arc::clone(&state));

    let sweeper = tokio::spawn(sweep_loop(Arc::clone(&state)));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Toolgate listening on http://{bind_addr}");
    info!("  JSON-RPC:  POST /jsonrpc, POST /mcp");
    info!("  WebSocket: GET /ws");
    info!("  SSE:       GET /sse, POST /messages");
    info!("  Health:    GET /health");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

/// Periodic maintenance: sweep dead refresh records, expired API tokens,
/// and stale rate-limiter keys
async fn sweep_loop(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;

        if let Err(error) = state.auth.refresh().sweep().await {
            warn!(%error, "Refresh-record sweep failed");
        }
        if let Err(error) = state.store.delete_expired_api_tokens(Utc::now()).await {
            warn!(%error, "API-token sweep failed");
        }
        let horizon = chrono::Duration::milliseconds(
            i64::try_from(state.config.rate_limit.window_ms.saturating_mul(2)).unwrap_or(i64::MAX),
        );
        state.limiter.cleanup(horizon);
    }
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
