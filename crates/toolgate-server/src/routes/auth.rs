//! Session routes: login, refresh, sign-up

use crate::routes::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use toolgate_core::LoginOutcome;
use toolgate_domain::Identity;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub login: String,
    /// Password
    pub password: String,
}

/// Refresh request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh-token secret issued at login or the previous rotation
    pub refresh_token: String,
}

/// Sign-up request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Desired login name
    pub login: String,
    /// Password
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Public identity shape returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    /// Identity id
    pub id: String,
    /// Login name
    pub login: String,
    /// Display name
    pub display_name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Administrator flag
    pub is_admin: bool,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            login: identity.login,
            display_name: identity.display_name,
            created_at: identity.created_at,
            is_admin: identity.is_admin,
        }
    }
}

/// Token-pair response for login and refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Signed session token
    pub access_token: String,
    /// Session-token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Refresh-token secret - store it; it is shown exactly once
    pub refresh_token: String,
    /// Refresh-token expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// The authenticated identity
    pub user: IdentityResponse,
}

impl From<LoginOutcome> for SessionResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            access_token: outcome.access_token,
            access_expires_at: outcome.access_expires_at,
            refresh_token: outcome.refresh_token,
            refresh_expires_at: outcome.refresh_expires_at,
            user: outcome.identity.into(),
        }
    }
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let outcome = state.auth.login(&body.login, &body.password).await?;
    Ok(Json(outcome.into()))
}

/// POST /auth/refresh
///
/// Rotates the presented refresh token. An expired token answers 401 with
/// an "expired" message so clients can prompt a re-login; an unknown or
/// already-rotated one answers 401 "invalid".
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let outcome = state.auth.rotate(&body.refresh_token).await?;
    Ok(Json(outcome.into()))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let identity = state
        .auth
        .register(
            &body.login,
            &body.password,
            body.display_name.as_deref().unwrap_or(""),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(identity.into())))
}
