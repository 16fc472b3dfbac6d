//! Password hashing with Argon2id and bcrypt migration support
//!
//! New hashes are always Argon2id (PHC string format). Verification
//! auto-detects the algorithm so bcrypt hashes imported from older
//! deployments keep working. Both verifiers compare in constant time.

use toolgate_domain::{Error, Result};

/// Hash a secret using Argon2id
///
/// Returns the PHC string format hash that includes algorithm parameters
/// and the salt.
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal(format!("Password hashing failed: {e}")))
}

/// Verify a secret against an Argon2id hash
pub fn verify_argon2(password: &str, hash: &str) -> Result<bool> {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| Error::internal(format!("Invalid hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify a secret against a bcrypt hash (migration path)
pub fn verify_bcrypt(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| Error::internal(format!("Password verification failed: {e}")))
}

/// Verify a secret against a hash, auto-detecting the algorithm
///
/// Supports Argon2id (`$argon2...`) and bcrypt (`$2a$`/`$2b$`/`$2y$`).
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    if hash.is_empty() {
        return Ok(false);
    }

    if hash.starts_with("$argon2") {
        verify_argon2(password, hash)
    } else if hash.starts_with("$2") {
        verify_bcrypt(password, hash)
    } else {
        Err(Error::internal("Unknown password hash format"))
    }
}
