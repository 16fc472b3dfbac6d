//! Admin identity management routes

use crate::routes::auth::IdentityResponse;
use crate::routes::{require_admin, ApiError};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use toolgate_core::AuthContext;
use toolgate_domain::CredentialStore;

/// Admin identity-creation request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityRequest {
    /// Login name for the new identity
    pub login: String,
    /// Initial password
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// GET /admin/identities
pub async fn list_identities(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
) -> Result<Json<Vec<IdentityResponse>>, ApiError> {
    require_admin(auth_ctx.as_deref())?;
    let identities = state.store.list_identities().await?;
    Ok(Json(
        identities.into_iter().map(IdentityResponse::from).collect(),
    ))
}

/// POST /admin/identities
pub async fn create_identity(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Json(body): Json<CreateIdentityRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    require_admin(auth_ctx.as_deref())?;
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

/// DELETE /admin/identities/{id}
///
/// Cascades: the identity's refresh records, API tokens, and settings are
/// deleted with it, so its former credentials verify as "not found".
pub async fn delete_identity(
    State(state): State<Arc<AppState>>,
    auth_ctx: Option<Extension<AuthContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_admin(auth_ctx.as_deref())?;
    if !state.auth.delete_identity(&id).await? {
        return Err(ApiError::not_found(&format!("Identity not found: {id}")));
    }
    Ok(Json(json!({ "message": format!("Identity {id} removed") })))
}
