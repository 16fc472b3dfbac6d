//! Cryptographic utilities
//!
//! Random secret generation and AES-256-GCM encryption of stored setting
//! values.

mod secrets;
mod settings_cipher;

pub use secrets::{generate_api_token_secret, generate_hex_secret, generate_refresh_secret};
pub use settings_cipher::SettingsCipher;
