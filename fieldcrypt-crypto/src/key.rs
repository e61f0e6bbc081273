//! Key and salt material.
//!
//! The cipher key is the SHA-256 digest of a configured secret, so any secret
//! length yields a 256-bit AES key.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// A cipher key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Derives the key from a configured secret by hashing it with SHA-256.
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// System-wide salt prepended to every plaintext before encryption.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SystemSalt {
    bytes: Vec<u8>,
}

impl SystemSalt {
    /// Creates a salt from configured text.
    pub fn new(salt: &str) -> Self {
        Self {
            bytes: salt.as_bytes().to_vec(),
        }
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Salt length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty salt.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Strips the salt from the front of `data` if it is present.
    pub fn strip<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data.strip_prefix(self.bytes.as_slice()).unwrap_or(data)
    }
}

impl std::fmt::Debug for SystemSalt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSalt")
            .field("len", &self.bytes.len())
            .finish()
    }
}
