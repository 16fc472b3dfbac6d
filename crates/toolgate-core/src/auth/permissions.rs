//! Permission evaluation
//!
//! The single rule that gates every capability invocation. Evaluation is
//! pure and side-effect-free, and it runs on every call - results are
//! never cached, because a credential's scope can change between calls.

use serde::{Deserialize, Serialize};
use toolgate_domain::{RateLimitSpec, WILDCARD_SCOPE};

/// The resolved caller attached to a request after authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated identity id
    pub identity_id: String,
    /// Administrator flag (from the session claims or owning identity)
    pub is_admin: bool,
    /// Explicit permission scope carried by the credential.
    /// `None` means the credential is unrestricted within the identity's
    /// own capability namespace.
    pub permissions: Option<Vec<String>>,
    /// Rate-limit key for this credential
    pub rate_key: String,
    /// Credential-specific rate limit, if one is configured
    pub rate_limit: Option<RateLimitSpec>,
}

impl AuthContext {
    /// Context for a session-token credential
    pub fn for_session(identity_id: String, is_admin: bool) -> Self {
        let rate_key = format!("identity:{identity_id}");
        Self {
            identity_id,
            is_admin,
            permissions: None,
            rate_key,
            rate_limit: None,
        }
    }

    /// Context for an API-token credential
    pub fn for_api_token(
        identity_id: String,
        is_admin: bool,
        permissions: Option<Vec<String>>,
        secret: &str,
        rate_limit: Option<RateLimitSpec>,
    ) -> Self {
        Self {
            identity_id,
            is_admin,
            permissions,
            rate_key: format!("token:{secret}"),
            rate_limit,
        }
    }
}

/// Decide whether a credential may invoke a capability
///
/// - administrators are always granted;
/// - a credential carrying an explicit scope is granted iff the scope
///   contains the wildcard element or the exact capability name;
/// - a credential with no scope is granted - but only within its own
///   identity's namespace, which capability resolution already enforces.
pub fn has_permission(ctx: &AuthContext, capability: &str) -> bool {
    if ctx.is_admin {
        return true;
    }
    match &ctx.permissions {
        Some(scope) => scope.iter().any(|p| p == WILDCARD_SCOPE || p == capability),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(is_admin: bool, permissions: Option<Vec<&str>>) -> AuthContext {
        AuthContext {
            identity_id: "user-1".into(),
            is_admin,
            permissions: permissions.map(|p| p.into_iter().map(String::from).collect()),
            rate_key: "identity:user-1".into(),
            rate_limit: None,
        }
    }

    #[test]
    fn test_exact_match_grants() {
        let ctx = ctx(false, Some(vec!["weather"]));
        assert!(has_permission(&ctx, "weather"));
        assert!(!has_permission(&ctx, "calculator"));
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let ctx = ctx(false, Some(vec!["*"]));
        assert!(has_permission(&ctx, "weather"));
        assert!(has_permission(&ctx, "anything-at-all"));
    }

    #[test]
    fn test_admin_overrides_scope() {
        let ctx = ctx(true, Some(vec![]));
        assert!(has_permission(&ctx, "calculator"));
    }

    #[test]
    fn test_empty_scope_denies() {
        let ctx = ctx(false, Some(vec![]));
        assert!(!has_permission(&ctx, "weather"));
    }

    #[test]
    fn test_absent_scope_grants_own_namespace() {
        let ctx = ctx(false, None);
        assert!(has_permission(&ctx, "weather"));
    }
}
