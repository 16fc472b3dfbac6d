//! Credential extraction and resolution
//!
//! Every transport funnels its raw credential through the same two steps:
//! pick one source in priority order (explicit protocol parameter, then
//! bearer authorization, then API-key header), then resolve it - session
//! token first, API token second. The resolver is what makes the
//! authorization semantics identical across HTTP, WebSocket, and SSE.

use toolgate_core::{AuthContext, AuthService};
use toolgate_domain::{Error, Result};

/// Select a credential from the three supported sources
///
/// Priority order: explicit protocol parameter, `Authorization: Bearer`,
/// API-key header. First match wins.
pub fn extract_credential(
    param_token: Option<&str>,
    authorization: Option<&str>,
    api_key: Option<&str>,
) -> Option<String> {
    if let Some(token) = param_token.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }
    if let Some(value) = authorization {
        if let Some(token) = value.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    api_key.filter(|k| !k.is_empty()).map(String::from)
}

/// Resolves raw credentials into caller contexts
#[derive(Clone)]
pub struct CredentialResolver {
    auth: AuthService,
}

impl CredentialResolver {
    /// Create a resolver over the auth service
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// Whether authentication is enforced at all
    pub fn auth_enabled(&self) -> bool {
        self.auth.is_enabled()
    }

    /// Resolve an extracted credential into a caller context
    ///
    /// `Ok(None)` means no credential was presented. A presented credential
    /// that matches neither a session token nor an API token fails with
    /// `Unauthenticated` - the caller learns nothing about which form was
    /// expected.
    pub async fn resolve(&self, credential: Option<&str>) -> Result<Option<AuthContext>> {
        let Some(credential) = credential else {
            return Ok(None);
        };

        if let Ok(context) = self.auth.context_from_session(credential) {
            return Ok(Some(context));
        }
        if let Some(context) = self.auth.context_from_api_token(credential).await? {
            return Ok(Some(context));
        }

        Err(Error::unauthenticated("Authentication failed"))
    }
}
