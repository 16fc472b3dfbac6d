//! HTTP transport
//!
//! The JSON-RPC endpoints, the SSE push stream, health, the tool listing,
//! and the REST management surface, assembled into one router.

use crate::routes::{self, admin, auth, settings, tokens, API_KEY_HEADER};
use crate::rpc::envelope::{RpcError, RpcResponse, PARSE_ERROR};
use crate::rpc::{extract_credential, DispatchContext};
use crate::state::AppState;
use crate::transport::ws;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use toolgate_core::{has_permission, AuthContext};
use toolgate_domain::{CredentialStore, ToolHost};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Assemble the full router
pub fn build_router(state: Arc<AppState>) -> Router {
    let managed = Router::new()
        .route("/tools", get(list_tools))
        .route("/tokens", post(tokens::create_token).get(tokens::list_tokens))
        .route("/tokens/{secret}", delete(tokens::revoke_token))
        .route("/settings", get(settings::list_settings))
        .route(
            "/settings/{key}",
            put(settings::put_setting).delete(settings::delete_setting),
        )
        .route(
            "/admin/identities",
            get(admin::list_identities).post(admin::create_identity),
        )
        .route("/admin/identities/{id}", delete(admin::delete_identity))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            routes::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/jsonrpc", post(handle_rpc))
        .route("/mcp", post(handle_rpc))
        .route("/sse", get(sse_stream))
        .route("/messages", post(sse_messages))
        .route("/ws", get(ws::ws_upgrade))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/register", post(auth::register))
        .merge(managed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the dispatch context for a plain HTTP request
fn dispatch_context(
    query: &HashMap<String, String>,
    headers: &HeaderMap,
    addr: SocketAddr,
) -> DispatchContext {
    DispatchContext {
        credential: extract_credential(
            query.get("token").map(String::as_str),
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
            headers
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok()),
        ),
        origin: addr.ip().to_string(),
    }
}

/// POST /jsonrpc and /mcp - the request/response protocol channel
async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let ctx = dispatch_context(&query, &headers, addr);
    let body: Value = match serde_json::from_str(&body) {
        Ok(body) => body,
        Err(_) => {
            return Json(
                RpcResponse::failure(Value::Null, RpcError::new(PARSE_ERROR, "Parse error"))
                    .to_value(),
            );
        }
    };
    Json(state.dispatcher.dispatch_value(body, &ctx).await)
}

/// GET /health - liveness plus auth stats, no credential required
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.store.stats().await.unwrap_or_default();
    let tools = state
        .tool_host
        .list_capabilities(None)
        .await
        .map(|specs| specs.into_iter().map(|s| s.name).collect::<Vec<_>>())
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "tools": tools,
        "auth": {
            "enabled": state.auth.is_enabled(),
            "identities": stats.identities,
            "apiTokens": stats.api_tokens,
            "activeRefreshRecords": stats.active_refresh_records,
            "trackedRateKeys": state.limiter.tracked_keys(),
        }
    }))
}

/// GET /tools - the caller's visible, permission-filtered tool list
async fn list_tools(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
) -> Result<Json<Value>, routes::ApiError> {
    let auth_ctx = auth_ctx.map(|Extension(ctx)| ctx);
    let identity_id = auth_ctx.as_ref().map(|a| a.identity_id.as_str());
    let specs = state.tool_host.list_capabilities(identity_id).await?;

    let tools: Vec<Value> = specs
        .into_iter()
        .filter(|spec| {
            auth_ctx
                .as_ref()
                .is_none_or(|ctx| has_permission(ctx, &spec.name))
        })
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": spec.input_schema(),
            })
        })
        .collect();

    Ok(Json(json!({ "jsonrpc": "2.0", "result": { "tools": tools } })))
}

/// GET /sse - subscribe to the server-push stream
///
/// Sends the message endpoint first (per the MCP SSE handshake), then
/// every dispatched response broadcast by POST /messages.
async fn sse_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("SSE client connected");
    let rx = state.sse_tx.subscribe();

    let endpoint = stream::once(async { Ok(Event::default().event("endpoint").data("/messages")) });
    let messages = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    return Some((Ok(Event::default().event("message").data(payload)), rx));
                }
                // slow subscriber: skip what was missed, keep streaming
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(endpoint.chain(messages)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("heartbeat"),
    )
}

/// POST /messages - dispatch an envelope and broadcast the response
///
/// Answers 202 Accepted; the response envelope reaches every connected
/// SSE subscriber.
async fn sse_messages(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let ctx = dispatch_context(&query, &headers, addr);
    let response = match serde_json::from_str(&body) {
        Ok(body) => state.dispatcher.dispatch_value(body, &ctx).await,
        Err(_) => RpcResponse::failure(Value::Null, RpcError::new(PARSE_ERROR, "Parse error"))
            .to_value(),
    };

    let _ = state.sse_tx.send(response.to_string());
    StatusCode::ACCEPTED
}
