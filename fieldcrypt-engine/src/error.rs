//! Error types for the interception engine.

use crate::context::{LifecycleEvent, ObjectId};
use fieldcrypt_crypto::EncryptorError;
use fieldcrypt_model::{HandlerRef, ModelError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while intercepting lifecycle events.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A hook received event arguments of the wrong shape.
    #[error("invalid argument for {event}: expected {expected} arguments, got {actual}")]
    InvalidLifecycleArgument {
        event: LifecycleEvent,
        expected: &'static str,
        actual: &'static str,
    },

    /// A field names a custom handler that is not registered.
    #[error("method \"{0}\" is not a callable method")]
    HandlerNotCallable(HandlerRef),

    /// A custom handler ran and reported failure.
    #[error("handler {handler} failed: {reason}")]
    Handler { handler: HandlerRef, reason: String },

    /// Encryption or decryption of a field value failed.
    #[error("cipher failure: {0}")]
    CipherFailure(#[from] EncryptorError),

    /// The object's identifier cannot be resolved for registry bookkeeping.
    #[error("cannot resolve a single identifier for {0}")]
    UnsupportedIdentifierMapping(String),

    /// An event referenced an object the persistence context does not track.
    #[error("object {0} is not tracked by the persistence context")]
    UnknownObject(ObjectId),

    /// Field access failed.
    #[error("field access error: {0}")]
    Model(#[from] ModelError),

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration text is not valid TOML for the expected shape.
    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// IO error (reading a configuration file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
