//! Encrypted per-identity settings routes

use crate::routes::{require_identity, ApiError};
use crate::rpc::envelope::{RpcError, INTERNAL_ERROR};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use toolgate_core::{AuthContext, SettingsService};

/// Setting-update request body
#[derive(Debug, Deserialize)]
pub struct PutSettingRequest {
    /// The plaintext value; it is encrypted before it reaches the store
    pub value: String,
}

/// Fail clearly when no encryption key is configured
fn settings_service(state: &AppState) -> Result<&SettingsService, ApiError> {
    state.settings.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            RpcError::new(
                INTERNAL_ERROR,
                "Settings are unavailable: no encryption key is configured",
            ),
        )
    })
}

/// GET /settings
pub async fn list_settings(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
) -> Result<Json<Value>, ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let service = settings_service(&state)?;
    let keys = service.keys(&auth_ctx.identity_id).await?;
    Ok(Json(json!({ "keys": keys })))
}

/// PUT /settings/{key}
pub async fn put_setting(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Path(key): Path<String>,
    Json(body): Json<PutSettingRequest>,
) -> Result<Json<Value>, ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let service = settings_service(&state)?;
    service.set(&auth_ctx.identity_id, &key, &body.value).await?;
    Ok(Json(json!({ "message": "Setting stored", "key": key })))
}

/// DELETE /settings/{key}
pub async fn delete_setting(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let auth_ctx = require_identity(auth_ctx.as_deref())?;
    let service = settings_service(&state)?;
    if !service.delete(&auth_ctx.identity_id, &key).await? {
        return Err(ApiError::not_found("Setting not found"));
    }
    Ok(Json(json!({ "message": "Setting deleted", "key": key })))
}
