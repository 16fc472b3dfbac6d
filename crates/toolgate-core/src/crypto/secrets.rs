//! Secure secret generation

use crate::constants::{API_TOKEN_PREFIX, API_TOKEN_SECRET_BYTES, REFRESH_SECRET_BYTES};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a cryptographically secure random secret, hex-encoded
pub fn generate_hex_secret(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate an API-token secret: recognizable prefix plus 192 random bits
pub fn generate_api_token_secret() -> String {
    format!(
        "{}{}",
        API_TOKEN_PREFIX,
        generate_hex_secret(API_TOKEN_SECRET_BYTES)
    )
}

/// Generate a refresh-token secret
pub fn generate_refresh_secret() -> String {
    generate_hex_secret(REFRESH_SECRET_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_secret_length() {
        // hex doubles the byte length
        assert_eq!(generate_hex_secret(24).len(), 48);
    }

    #[test]
    fn test_api_token_prefix() {
        let secret = generate_api_token_secret();
        assert!(secret.starts_with(API_TOKEN_PREFIX));
        assert_eq!(secret.len(), API_TOKEN_PREFIX.len() + API_TOKEN_SECRET_BYTES * 2);
    }

    #[test]
    fn test_secrets_are_unique() {
        assert_ne!(generate_refresh_secret(), generate_refresh_secret());
    }
}
