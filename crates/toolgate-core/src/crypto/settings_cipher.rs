//! Setting-value encryption using AES-256-GCM
//!
//! Stored form is `hex(nonce || ciphertext)` with a fresh random nonce per
//! value; the GCM authentication tag rides inside the ciphertext.

use crate::constants::{AES_GCM_KEY_SIZE, AES_GCM_NONCE_SIZE};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use toolgate_domain::{Error, Result};

/// Encrypts and decrypts per-identity setting values
#[derive(Clone)]
pub struct SettingsCipher {
    /// Master key for encryption operations
    master_key: Vec<u8>,
}

impl SettingsCipher {
    /// Create a new cipher from the configured master key
    pub fn new(master_key: &[u8]) -> Result<Self> {
        if master_key.len() != AES_GCM_KEY_SIZE {
            return Err(Error::config(format!(
                "Invalid settings encryption key size: expected {} bytes, got {}",
                AES_GCM_KEY_SIZE,
                master_key.len()
            )));
        }
        Ok(Self {
            master_key: master_key.to_vec(),
        })
    }

    /// Encrypt a plaintext value into its stored form
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = Key::<Aes256Gcm>::from_slice(&self.master_key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::internal(format!("Encryption failed: {e}")))?;

        let mut packed = nonce.to_vec();
        packed.extend_from_slice(&ciphertext);
        Ok(hex::encode(packed))
    }

    /// Decrypt a stored value back to plaintext
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let packed = hex::decode(stored)
            .map_err(|e| Error::internal(format!("Invalid stored value encoding: {e}")))?;
        if packed.len() <= AES_GCM_NONCE_SIZE {
            return Err(Error::internal("Stored value too short"));
        }
        let (nonce_bytes, ciphertext) = packed.split_at(AES_GCM_NONCE_SIZE);

        let key = Key::<Aes256Gcm>::from_slice(&self.master_key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| Error::internal(format!("Decryption failed: {e}")))?;

        String::from_utf8(plaintext).map_err(|e| Error::internal(format!("Invalid UTF-8: {e}")))
    }
}
