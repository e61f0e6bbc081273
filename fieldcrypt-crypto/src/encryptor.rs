//! The encryptor capability consumed by the field engine.
//!
//! Consumers depend on `Arc<dyn Encryptor>` and never see raw keys.
//! [`PrefixedAesEncryptor`](crate::PrefixedAesEncryptor) is the production
//! implementation; tests can use `PassthroughEncryptor`.

use crate::error::CryptoError;
use thiserror::Error;

/// Errors from the encryption layer.
#[derive(Debug, Error)]
pub enum EncryptorError {
    /// The encryptor has no key material.
    #[error("encryptor unavailable")]
    Unavailable,
    /// Underlying crypto failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

pub type EncryptorResult<T> = Result<T, EncryptorError>;

/// Trait for encrypting/decrypting field values.
///
/// Implementations own the key material. `decrypt` must return any input that
/// does not carry the implementation's ciphertext marker unchanged, so values
/// written before encryption was enabled, or already decrypted, pass through.
pub trait Encryptor: Send + Sync {
    /// Encrypt `plaintext`. With `deterministic` set, equal plaintexts yield
    /// equal ciphertexts.
    fn encrypt(&self, plaintext: &[u8], deterministic: bool) -> EncryptorResult<Vec<u8>>;

    /// Decrypt a value previously produced by `encrypt`.
    fn decrypt(&self, data: &[u8], deterministic: bool) -> EncryptorResult<Vec<u8>>;

    /// Whether `data` carries this encryptor's ciphertext marker.
    fn is_encrypted(&self, data: &[u8]) -> bool;

    /// Encrypt a string value.
    fn encrypt_str(&self, plaintext: &str, deterministic: bool) -> EncryptorResult<String> {
        let encrypted = self.encrypt(plaintext.as_bytes(), deterministic)?;
        Ok(String::from_utf8(encrypted).map_err(CryptoError::from)?)
    }

    /// Decrypt a string value.
    fn decrypt_str(&self, data: &str, deterministic: bool) -> EncryptorResult<String> {
        let decrypted = self.decrypt(data.as_bytes(), deterministic)?;
        Ok(String::from_utf8(decrypted).map_err(CryptoError::from)?)
    }
}

/// No-op encryptor for tests. Data passes through unchanged.
pub struct PassthroughEncryptor;

impl Encryptor for PassthroughEncryptor {
    fn encrypt(&self, plaintext: &[u8], _deterministic: bool) -> EncryptorResult<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, data: &[u8], _deterministic: bool) -> EncryptorResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn is_encrypted(&self, _data: &[u8]) -> bool {
        false
    }
}
