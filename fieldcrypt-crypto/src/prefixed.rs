//! Prefixed AES-256-CBC field encryption.
//!
//! # Wire format
//!
//! ```text
//! prefix || base64(iv || AES-256-CBC(key, iv, zero_pad(salt || plaintext)))
//! ```
//!
//! - `key` is SHA-256 of the configured secret.
//! - `iv` is all zero for deterministic encryption, random otherwise.
//! - `prefix` (default `_ENC_`) only marks a value as ciphertext; `decrypt`
//!   returns anything without it unchanged.
//!
//! # Known limitation
//!
//! Zero padding is stripped greedily on decryption, so a plaintext that itself
//! ends in `0x00` bytes loses them. The format carries no length or
//! authentication tag; it is kept for compatibility with values already stored
//! in this format. Binary payloads should be serialized by a custom field
//! handler into a form that cannot end in a zero byte.

use crate::cipher::{self, EncryptedData};
use crate::encryptor::{Encryptor, EncryptorResult};
use crate::error::CryptoError;
use crate::key::{SecretKey, SystemSalt};

/// AES-256-CBC encryptor producing prefixed, base64-framed ciphertext.
#[derive(Debug)]
pub struct PrefixedAesEncryptor {
    key: SecretKey,
    salt: SystemSalt,
    prefix: String,
}

impl PrefixedAesEncryptor {
    /// Marker used when none is configured.
    pub const DEFAULT_PREFIX: &'static str = "_ENC_";

    /// Creates an encryptor from a secret, a system salt and a ciphertext prefix.
    pub fn new(secret_key: &str, system_salt: &str, prefix: impl Into<String>) -> Self {
        Self {
            key: SecretKey::from_secret(secret_key),
            salt: SystemSalt::new(system_salt),
            prefix: prefix.into(),
        }
    }

    /// Creates an encryptor using [`Self::DEFAULT_PREFIX`].
    pub fn with_default_prefix(secret_key: &str, system_salt: &str) -> Self {
        Self::new(secret_key, system_salt, Self::DEFAULT_PREFIX)
    }

    /// The ciphertext marker.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Encryptor for PrefixedAesEncryptor {
    fn encrypt(&self, plaintext: &[u8], deterministic: bool) -> EncryptorResult<Vec<u8>> {
        let mut salted = Vec::with_capacity(self.salt.len() + plaintext.len());
        salted.extend_from_slice(self.salt.as_bytes());
        salted.extend_from_slice(plaintext);

        let encrypted = cipher::encrypt(&self.key, cipher::iv_for(deterministic), &salted)?;

        let mut framed = self.prefix.clone().into_bytes();
        framed.extend_from_slice(encrypted.to_base64().as_bytes());
        Ok(framed)
    }

    // The IV travels with the ciphertext, so `deterministic` is not needed here.
    fn decrypt(&self, data: &[u8], _deterministic: bool) -> EncryptorResult<Vec<u8>> {
        let Some(body) = data.strip_prefix(self.prefix.as_bytes()) else {
            return Ok(data.to_vec());
        };

        let body = std::str::from_utf8(body)
            .map_err(|e| CryptoError::InvalidCiphertext(format!("non-ASCII body: {}", e)))?;
        let encrypted = EncryptedData::from_base64(body)?;
        let salted = cipher::decrypt(&self.key, &encrypted)?;

        Ok(cipher::strip_zero_padding(self.salt.strip(&salted)).to_vec())
    }

    fn is_encrypted(&self, data: &[u8]) -> bool {
        data.starts_with(self.prefix.as_bytes())
    }
}
