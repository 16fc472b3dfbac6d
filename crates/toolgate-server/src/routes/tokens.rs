//! API-token self-service routes

use crate::routes::{require_identity, ApiError};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use toolgate_core::AuthContext;
use toolgate_domain::{ApiTokenRecord, RateLimitSpec};

/// Token-creation request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    /// Friendly name for the token
    pub name: String,
    /// Permission scope; omit for full access to the caller's own tools
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    /// Optional expiry in days from now
    #[serde(default)]
    pub expires_in_days: Option<i64>,
    /// Optional per-token rate limit
    #[serde(default)]
    pub rate_limit: Option<RateLimitSpec>,
}

/// API-token shape returned to its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// The token secret (the credential itself)
    pub token: String,
    /// Friendly name
    pub name: String,
    /// Permission scope
    pub permissions: Option<Vec<String>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Expiry, if any
    pub expires_at: Option<DateTime<Utc>>,
    /// Last authentication time, if any
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiTokenRecord> for TokenResponse {
    fn from(record: ApiTokenRecord) -> Self {
        Self {
            token: record.secret,
            name: record.name,
            permissions: record.permissions,
            created_at: record.created_at,
            expires_at: record.expires_at,
            last_used_at: record.last_used_at,
        }
    }
}

/// POST /tokens
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Json(body): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let record = state
        .auth
        .api_tokens()
        .create(
            &auth_ctx.identity_id,
            &body.name,
            body.permissions,
            body.expires_in_days,
            body.rate_limit,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /tokens
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
) -> Result<Json<Vec<TokenResponse>>, ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let tokens = state.auth.api_tokens().list(&auth_ctx.identity_id).await?;
    Ok(Json(tokens.into_iter().map(TokenResponse::from).collect()))
}

/// DELETE /tokens/{secret}
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Path(secret): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let removed = state
        .auth
        .api_tokens()
        .revoke(&secret, &auth_ctx.identity_id, auth_ctx.is_admin)
        .await?;
    if !removed {
        return Err(ApiError::not_found("Token not found"));
    }
    Ok(Json(json!({ "message": "Token revoked" })))
}
