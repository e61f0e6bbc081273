//! AES-256-CBC block encryption with zero padding.
//!
//! Plaintext is right-padded with zero bytes to a multiple of the block size
//! before encryption, and the IV travels in front of the ciphertext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SecretKey;
use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Encrypted data together with the IV needed to decrypt it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    /// The IV used for encryption (all zero for deterministic encryption).
    pub iv: [u8; IV_SIZE],
    /// The raw CBC ciphertext, a whole number of blocks.
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Returns the total framed size in bytes.
    pub fn len(&self) -> usize {
        IV_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Encodes `iv || ciphertext` as base64 with trailing NUL bytes stripped.
    pub fn to_base64(&self) -> String {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(&bytes).trim_end_matches('\0').to_string()
    }

    /// Decodes `iv || ciphertext` from base64.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidCiphertext(format!("invalid base64: {}", e)))?;

        if bytes.len() < IV_SIZE {
            return Err(CryptoError::InvalidIvLength {
                expected: IV_SIZE,
                actual: bytes.len(),
            });
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&bytes[..IV_SIZE]);
        let ciphertext = bytes[IV_SIZE..].to_vec();

        Ok(Self { iv, ciphertext })
    }
}

/// The all-zero IV used for deterministic (searchable) encryption.
pub fn zero_iv() -> [u8; IV_SIZE] {
    [0u8; IV_SIZE]
}

/// A fresh IV from the OS random source.
pub fn random_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Selects the IV for one encryption.
pub fn iv_for(deterministic: bool) -> [u8; IV_SIZE] {
    if deterministic { zero_iv() } else { random_iv() }
}

/// Right-pads `data` with zero bytes to a multiple of [`BLOCK_SIZE`].
///
/// Already aligned input (including empty input) is left as is.
pub fn zero_pad(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    let remainder = padded.len() % BLOCK_SIZE;
    if remainder > 0 {
        padded.resize(padded.len() + BLOCK_SIZE - remainder, 0);
    }
    padded
}

/// Strips every trailing zero byte.
///
/// This cannot tell padding apart from zero bytes that belonged to the
/// plaintext, so payloads ending in `0x00` do not round-trip.
pub fn strip_zero_padding(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

/// Encrypts `plaintext` with AES-256-CBC under `iv`, zero-padding first.
pub fn encrypt(key: &SecretKey, iv: [u8; IV_SIZE], plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let mut buf = zero_pad(plaintext);
    let len = buf.len();

    Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| CryptoError::Encryption("buffer is not block aligned".to_string()))?;

    Ok(EncryptedData {
        iv,
        ciphertext: buf,
    })
}

/// Decrypts AES-256-CBC ciphertext, returning the still zero-padded plaintext.
pub fn decrypt(key: &SecretKey, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    if encrypted.ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption(format!(
            "ciphertext length {} is not a multiple of {}",
            encrypted.ciphertext.len(),
            BLOCK_SIZE
        )));
    }

    let mut buf = encrypted.ciphertext.clone();
    let plaintext = Aes256CbcDec::new(key.as_bytes().into(), (&encrypted.iv).into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| CryptoError::Decryption("invalid block framing".to_string()))?;

    Ok(plaintext.to_vec())
}
