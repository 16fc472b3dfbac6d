//! REST management routes
//!
//! The non-RPC surface around the core: login/refresh/sign-up, API-token
//! self-service, encrypted settings, and admin identity management. All
//! of it shares one error shape and one authentication middleware.

pub mod admin;
pub mod auth;
pub mod settings;
pub mod tokens;

use crate::rpc::envelope::{
    RpcError, INVALID_PARAMS, PERMISSION_DENIED, RATE_LIMITED, UNAUTHENTICATED,
};
use crate::rpc::extract_credential;
use crate::state::AppState;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use toolgate_core::{AuthContext, RateDecision};
use toolgate_domain::Error;
use tracing::error;

/// Header carrying an API-key credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Uniform REST error: HTTP status plus the protocol error body
pub struct ApiError {
    status: StatusCode,
    error: RpcError,
}

impl ApiError {
    /// Build from a status and protocol error
    pub fn new(status: StatusCode, error: RpcError) -> Self {
        Self { status, error }
    }

    /// 401 with the given message
    pub fn unauthenticated(message: &str) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            RpcError::new(UNAUTHENTICATED, message),
        )
    }

    /// 403 with the given message
    pub fn forbidden(message: &str) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            RpcError::new(PERMISSION_DENIED, message),
        )
    }

    /// 404 with the given message
    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, RpcError::new(INVALID_PARAMS, message))
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::Unauthenticated { .. } | Error::CredentialExpired { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Error::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::InvalidArgument { .. } | Error::MalformedRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound { .. } | Error::CapabilityNotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                error!(%error, "REST request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, RpcError::from(&error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.error }))).into_response()
    }
}

/// Authentication + rate-limit middleware for the management routes
///
/// Resolves the caller's credential (query parameter, bearer header, or
/// API-key header), enforces its rate limit, stashes the `AuthContext` in
/// request extensions, and stamps `X-RateLimit-*` headers on the response.
/// With authentication disabled the request passes through anonymously.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.auth.is_enabled() {
        return next.run(request).await;
    }

    let headers = request.headers();
    let credential = extract_credential(
        query.get("token").map(String::as_str),
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
        headers.get(API_KEY_HEADER).and_then(|value| value.to_str().ok()),
    );
    let Some(credential) = credential else {
        return ApiError::unauthenticated("Authentication required").into_response();
    };

    let auth_ctx = match state.dispatcher.resolver().resolve(Some(&credential)).await {
        Ok(Some(auth_ctx)) => auth_ctx,
        Ok(None) => return ApiError::unauthenticated("Authentication required").into_response(),
        Err(error) => return ApiError::from(error).into_response(),
    };

    let spec = auth_ctx
        .rate_limit
        .unwrap_or_else(|| state.config.rate_limit.default_spec());
    let decision = state.limiter.check_and_record(&auth_ctx.rate_key, spec);
    if !decision.allowed {
        let mut response = ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            RpcError::with_data(
                RATE_LIMITED,
                "Rate limit exceeded",
                json!({ "limit": decision.limit, "resetAt": decision.reset_at.timestamp() }),
            ),
        )
        .into_response();
        apply_rate_headers(&mut response, &decision);
        return response;
    }

    request.extensions_mut().insert(auth_ctx);
    let mut response = next.run(request).await;
    apply_rate_headers(&mut response, &decision);
    response
}

/// Stamp the rate-limit headers onto a response
fn apply_rate_headers(response: &mut Response, decision: &RateDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_at.timestamp().to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }
}

/// Pull the caller context a handler needs, failing 401 when absent
///
/// Absent means authentication is disabled - the identity-scoped routes
/// cannot operate anonymously.
pub fn require_identity(auth_ctx: Option<&AuthContext>) -> Result<&AuthContext, ApiError> {
    auth_ctx.ok_or_else(|| ApiError::unauthenticated("Authentication required"))
}

/// Ensure the caller is an administrator
pub fn require_admin(auth_ctx: Option<&AuthContext>) -> Result<&AuthContext, ApiError> {
    let auth_ctx = require_identity(auth_ctx)?;
    if !auth_ctx.is_admin {
        return Err(ApiError::forbidden(
            "Insufficient permissions: Admin access required",
        ));
    }
    Ok(auth_ctx)
}
