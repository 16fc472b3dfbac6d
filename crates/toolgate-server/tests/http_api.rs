//! HTTP surface tests
//!
//! Exercise the axum router directly with in-process requests: public
//! endpoints, the JSON-RPC channel, and the authenticated management
//! surface.

mod common;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{test_config, test_state};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use toolgate_domain::CredentialStore;
use toolgate_server::transport::build_router;
use toolgate_server::AppState;
use tower::ServiceExt;

fn router(state: &Arc<AppState>) -> Router {
    build_router(Arc::clone(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let mut request = request;
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 54321))));

    let response = app.oneshot(request).await.expect("request should complete");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn test_health_is_public() {
    let state = test_state(test_config());
    let (status, body) = send(router(&state), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["auth"]["enabled"], true);
    assert!(body["tools"].as_array().expect("tools").len() >= 4);
}

#[tokio::test]
async fn test_jsonrpc_ping_over_http() {
    let state = test_state(test_config());
    let request = post_json("/jsonrpc", &json!({"jsonrpc": "2.0", "method": "server/ping", "id": 7}));
    let (status, body) = send(router(&state), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["pong"], true);
}

#[tokio::test]
async fn test_jsonrpc_parse_error() {
    let state = test_state(test_config());
    let request = Request::builder()
        .method("POST")
        .uri("/jsonrpc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, body) = send(router(&state), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_mcp_alias_matches_jsonrpc() {
    let state = test_state(test_config());
    let request = post_json("/mcp", &json!({"jsonrpc": "2.0", "method": "server/ping", "id": 1}));
    let (status, body) = send(router(&state), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["pong"], true);
}

#[tokio::test]
async fn test_tools_requires_credential() {
    let state = test_state(test_config());
    let (status, body) = send(router(&state), get("/tools")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn test_login_then_list_tools() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");

    let (status, body) = send(
        router(&state),
        post_json("/auth/login", &json!({"login": "alice", "password": "correct-horse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["accessToken"].as_str().expect("access token").to_string();
    assert_eq!(body["user"]["login"], "alice");

    let (status, body) = send(router(&state), get_authed("/tools", &access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["result"]["tools"].as_array().expect("tools").is_empty());
}

#[tokio::test]
async fn test_rate_limit_headers_on_managed_routes() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");
    let outcome = state.auth.login("alice", "correct-horse").await.expect("login");

    let mut request = get_authed("/tools", &outcome.access_token);
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 54321))));
    let response = router(&state)
        .oneshot(request)
        .await
        .expect("request should complete");

    assert!(response.headers().contains_key("X-RateLimit-Limit"));
    assert!(response.headers().contains_key("X-RateLimit-Remaining"));
    assert!(response.headers().contains_key("X-RateLimit-Reset"));
}

#[tokio::test]
async fn test_wrong_password_is_401() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");

    let (status, body) = send(
        router(&state),
        post_json("/auth/login", &json!({"login": "alice", "password": "nope-nope-nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_refresh_rotates_and_old_secret_dies() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");
    let outcome = state.auth.login("alice", "correct-horse").await.expect("login");

    let (status, body) = send(
        router(&state),
        post_json("/auth/refresh", &json!({"refreshToken": outcome.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refreshToken"].as_str().is_some());

    // the rotated-away secret no longer refreshes
    let (status, _) = send(
        router(&state),
        post_json("/auth/refresh", &json!({"refreshToken": outcome.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_endpoint_creates_identity() {
    let state = test_state(test_config());

    let (status, body) = send(
        router(&state),
        post_json(
            "/auth/register",
            &json!({"login": "bob", "password": "long-enough-pw", "displayName": "Bob"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["login"], "bob");
    assert_eq!(body["isAdmin"], false);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");
    let outcome = state.auth.login("alice", "correct-horse").await.expect("login");

    let (status, body) = send(
        router(&state),
        get_authed("/admin/identities", &outcome.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], -32003);
}

#[tokio::test]
async fn test_admin_can_manage_identities() {
    let mut config = test_config();
    config.auth.bootstrap_login = Some("root".to_string());
    config.auth.bootstrap_password = Some("root-password".to_string());
    let state = test_state(config);
    state.bootstrap().await.expect("bootstrap");

    let outcome = state.auth.login("root", "root-password").await.expect("login");
    let app = router(&state);

    // create
    let mut request = post_json(
        "/admin/identities",
        &json!({"login": "carol", "password": "long-enough-pw"}),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", outcome.access_token).parse().expect("header"),
    );
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    let carol_id = body["id"].as_str().expect("id").to_string();

    // list
    let (status, body) = send(
        app.clone(),
        get_authed("/admin/identities", &outcome.access_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("list").len(), 2);

    // delete cascades
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/identities/{carol_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", outcome.access_token))
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state
        .store
        .identity_by_id(&carol_id)
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn test_token_self_service_flow() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");
    let outcome = state.auth.login("alice", "correct-horse").await.expect("login");
    let app = router(&state);

    // create a scoped token
    let mut request = post_json("/tokens", &json!({"name": "ci", "permissions": ["echo"]}));
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", outcome.access_token).parse().expect("header"),
    );
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = body["token"].as_str().expect("secret").to_string();
    assert!(secret.starts_with("mcp_"));

    // the new token authenticates rpc calls
    let (status, body) = send(
        app.clone(),
        post_json(
            &format!("/jsonrpc?token={secret}"),
            &json!({"jsonrpc": "2.0", "method": "tools/list", "id": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["tools"][0]["name"], "echo");

    // revoke it
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/tokens/{secret}"))
        .header(header::AUTHORIZATION, format!("Bearer {}", outcome.access_token))
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    // a revoked token is simply unauthenticated
    let (status, body) = send(
        app,
        post_json(
            &format!("/jsonrpc?token={secret}"),
            &json!({"jsonrpc": "2.0", "method": "tools/list", "id": 2}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn test_settings_routes() {
    let state = test_state(test_config());
    state
        .auth
        .register("alice", "correct-horse", "Alice")
        .await
        .expect("register");
    let outcome = state.auth.login("alice", "correct-horse").await.expect("login");
    let app = router(&state);

    let request = Request::builder()
        .method("PUT")
        .uri("/settings/API_KEY")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", outcome.access_token))
        .body(Body::from(json!({"value": "hunter2"}).to_string()))
        .expect("request");
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), get_authed("/settings", &outcome.access_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"][0], "API_KEY");

    // value is encrypted at rest
    let identity = state
        .store
        .identity_by_login("alice")
        .await
        .expect("lookup")
        .expect("identity");
    let stored = state
        .store
        .get_setting(&identity.id, "API_KEY")
        .await
        .expect("raw")
        .expect("present");
    assert_ne!(stored, "hunter2");
}
