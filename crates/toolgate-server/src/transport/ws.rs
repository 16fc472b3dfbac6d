//! WebSocket transport
//!
//! Persistent duplex connections. The credential is presented once at
//! connect (query parameter or headers) and checked before any traffic is
//! served; each message then passes through the dispatcher with the same
//! semantics as every other transport. Messages are processed one at a
//! time per connection, so responses are delivered in receipt order.

use crate::routes::API_KEY_HEADER;
use crate::rpc::envelope::{RpcError, RpcResponse, PARSE_ERROR};
use crate::rpc::{extract_credential, DispatchContext};
use crate::state::AppState;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use toolgate_core::AuthContext;
use toolgate_domain::ToolHost;
use tracing::{debug, info};

/// Policy-violation close code, sent on failed authentication
const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// GET /ws - upgrade to a WebSocket connection
pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let credential = extract_credential(
        query.get("token").map(String::as_str),
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    ws.on_upgrade(move |socket| handle_socket(state, socket, credential, addr))
}

/// Serve one WebSocket connection
async fn handle_socket(
    state: Arc<AppState>,
    mut socket: WebSocket,
    credential: Option<String>,
    addr: SocketAddr,
) {
    // Authenticate before serving any traffic
    let auth_ctx: Option<AuthContext> = if state.auth.is_enabled() {
        match state
            .dispatcher
            .resolver()
            .resolve(credential.as_deref())
            .await
        {
            Ok(Some(auth_ctx)) => Some(auth_ctx),
            _ => {
                info!(origin = %addr, "WebSocket authentication failed");
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: CLOSE_POLICY_VIOLATION,
                        reason: "Authentication failed".into(),
                    })))
                    .await;
                return;
            }
        }
    } else {
        None
    };

    debug!(origin = %addr, "WebSocket client connected");

    // Initial notification: visible capabilities and caller info
    let identity_id = auth_ctx.as_ref().map(|a| a.identity_id.as_str());
    let tools: Vec<String> = state
        .tool_host
        .list_capabilities(identity_id)
        .await
        .map(|specs| specs.into_iter().map(|s| s.name).collect())
        .unwrap_or_default();
    let initialized = json!({
        "jsonrpc": "2.0",
        "method": "server/initialized",
        "params": {
            "capabilities": {
                "tools": tools,
                "authentication": state.auth.is_enabled(),
            },
            "userInfo": auth_ctx.as_ref().map(|a| json!({
                "userId": a.identity_id,
                "isAdmin": a.is_admin,
                "permissions": a.permissions,
            })),
        }
    });
    if socket
        .send(Message::Text(initialized.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    let ctx = DispatchContext {
        credential,
        origin: addr.ip().to_string(),
    };

    // One message at a time: responses go out in receipt order
    while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                let response = match serde_json::from_str::<Value>(&text) {
                    Ok(body) => state.dispatcher.dispatch_value(body, &ctx).await,
                    Err(_) => RpcResponse::failure(
                        Value::Null,
                        RpcError::new(PARSE_ERROR, "Parse error"),
                    )
                    .to_value(),
                };
                if socket
                    .send(Message::Text(response.to_string().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Message::Close(_) => break,
            // pings are answered by the library; ignore the rest
            _ => {}
        }
    }

    debug!(origin = %addr, "WebSocket client disconnected");
}
