//! Encryption layer for fieldcrypt.
//!
//! Provides the field-level encryption primitive:
//! - AES-256-CBC with a SHA-256 derived key
//! - Deterministic (zero IV) or randomized (random IV) encryption
//! - A configurable prefix marking stored values as ciphertext
//!
//! The [`Encryptor`] trait is the capability the field engine consumes.
//! Anything without the ciphertext prefix passes through `decrypt` untouched,
//! which keeps legacy plaintext readable and makes repeated decryption safe.

mod cipher;
mod config;
pub mod encryptor;
mod error;
mod key;
mod prefixed;

pub use cipher::{
    decrypt, encrypt, iv_for, random_iv, strip_zero_padding, zero_iv, zero_pad, EncryptedData,
    BLOCK_SIZE, IV_SIZE,
};
pub use config::EncryptorConfig;
pub use encryptor::{Encryptor, EncryptorError, EncryptorResult, PassthroughEncryptor};
pub use error::{CryptoError, CryptoResult};
pub use key::{SecretKey, SystemSalt, KEY_SIZE};
pub use prefixed::PrefixedAesEncryptor;
