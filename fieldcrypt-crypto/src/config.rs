//! Encryptor configuration.

use crate::error::{CryptoError, CryptoResult};
use crate::prefixed::PrefixedAesEncryptor;
use serde::Deserialize;

/// Settings for [`PrefixedAesEncryptor`].
#[derive(Clone, Deserialize)]
pub struct EncryptorConfig {
    /// Secret the cipher key is derived from.
    #[serde(default)]
    pub secret_key: String,

    /// Salt prepended to every plaintext.
    #[serde(default)]
    pub system_salt: String,

    /// Marker identifying stored ciphertext.
    #[serde(default = "default_prefix")]
    pub encrypted_prefix: String,
}

fn default_prefix() -> String {
    PrefixedAesEncryptor::DEFAULT_PREFIX.to_string()
}

impl EncryptorConfig {
    /// Creates a config with the default prefix.
    pub fn new(secret_key: impl Into<String>, system_salt: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            system_salt: system_salt.into(),
            encrypted_prefix: default_prefix(),
        }
    }

    /// Overrides the ciphertext prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.encrypted_prefix = prefix.into();
        self
    }

    /// Checks that every required option is present.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.secret_key.is_empty() {
            return Err(CryptoError::MissingOption("secret_key"));
        }
        if self.system_salt.is_empty() {
            return Err(CryptoError::MissingOption("system_salt"));
        }
        if self.encrypted_prefix.is_empty() {
            return Err(CryptoError::MissingOption("encrypted_prefix"));
        }
        Ok(())
    }

    /// Validates the config and builds the encryptor.
    pub fn build(&self) -> CryptoResult<PrefixedAesEncryptor> {
        self.validate()?;
        Ok(PrefixedAesEncryptor::new(
            &self.secret_key,
            &self.system_salt,
            self.encrypted_prefix.clone(),
        ))
    }
}

impl std::fmt::Debug for EncryptorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptorConfig")
            .field("secret_key", &"[REDACTED]")
            .field("system_salt", &"[REDACTED]")
            .field("encrypted_prefix", &self.encrypted_prefix)
            .finish()
    }
}
