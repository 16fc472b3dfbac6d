//! Session-token issuing and verification
//!
//! Tokens are HS256-signed over the claim set with a fixed configured
//! secret. Verification fails uniformly on malformed, tampered, or expired
//! input - callers learn only "invalid", never which check failed.

pub use crate::auth::claims::SessionClaims;
use crate::constants::JWT_SECRET_MIN_LENGTH;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use toolgate_domain::{Error, Result};

/// Mints and verifies signed session tokens
#[derive(Clone)]
pub struct SessionTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
    issuer: String,
}

impl SessionTokenIssuer {
    /// Create an issuer from the configured signing secret
    pub fn new(secret: &str, ttl_secs: u64, issuer: String) -> Result<Self> {
        if secret.len() < JWT_SECRET_MIN_LENGTH {
            return Err(Error::config(format!(
                "Session signing secret must be at least {JWT_SECRET_MIN_LENGTH} bytes"
            )));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            issuer,
        })
    }

    /// Issue a session token for an identity
    ///
    /// Pure function of the inputs and the clock; no side effects.
    pub fn issue(&self, identity_id: &str, is_admin: bool) -> Result<(String, DateTime<Utc>)> {
        let claims = SessionClaims::new(
            identity_id.to_string(),
            is_admin,
            self.issuer.clone(),
            self.ttl_secs,
        );
        let expires_at = Utc
            .timestamp_opt(i64::try_from(claims.exp).unwrap_or(i64::MAX), 0)
            .single()
            .ok_or_else(|| Error::internal("Token expiry out of range"))?;

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::internal(format!("Token signing failed: {e}")))?;
        Ok((token, expires_at))
    }

    /// Verify a session token and decode its claims
    ///
    /// Fails uniformly: signature failures, malformed input, and expired
    /// tokens all surface the same `Unauthenticated` error.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::unauthenticated("Invalid session token"))
    }
}
