//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The value carries the ciphertext prefix but its body is not valid framing.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid initialization vector length.
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    /// A required configuration option is missing or empty.
    #[error("you must specify {0} option")]
    MissingOption(&'static str),

    /// Decrypted bytes were requested as text but are not UTF-8.
    #[error("decrypted value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
