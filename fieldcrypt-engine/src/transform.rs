//! Value transforms: the primitive encryption path and handler dispatch.

use crate::error::{EngineError, EngineResult};
use crate::handler::HandlerRegistry;
use fieldcrypt_crypto::Encryptor;
use fieldcrypt_model::{Encrypted, Operation, Persistable};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Marks plaintext that was produced from a boolean or a number.
const SCALAR_TAG: char = '\u{1}';

/// Transforms field values in either direction.
///
/// Strings are encrypted or decrypted. Arrays and objects are walked
/// element-wise. Null passes through. Booleans and numbers are encrypted from
/// their tagged JSON text and decrypt back to the same JSON type; on the
/// decrypt side they are never ciphertext and pass through.
pub struct ValueTransformer {
    encryptor: Arc<dyn Encryptor>,
    handlers: Arc<HandlerRegistry>,
}

impl ValueTransformer {
    pub fn new(encryptor: Arc<dyn Encryptor>, handlers: Arc<HandlerRegistry>) -> Self {
        Self {
            encryptor,
            handlers,
        }
    }

    pub fn encryptor(&self) -> &dyn Encryptor {
        self.encryptor.as_ref()
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Primitive transform, ignoring custom handlers.
    pub fn transform_value(
        &self,
        value: &Value,
        operation: Operation,
        deterministic: bool,
    ) -> EngineResult<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::String(text) => self.transform_text(text, operation, deterministic),
            Value::Bool(_) | Value::Number(_) => match operation {
                Operation::Encrypt => {
                    self.transform_text(&format!("{SCALAR_TAG}{value}"), operation, deterministic)
                }
                Operation::Decrypt => Ok(value.clone()),
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.transform_value(item, operation, deterministic))
                .collect::<EngineResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(entries) => entries
                .iter()
                .map(|(key, item)| {
                    Ok((key.clone(), self.transform_value(item, operation, deterministic)?))
                })
                .collect::<EngineResult<Map<_, _>>>()
                .map(Value::Object),
        }
    }

    fn transform_text(
        &self,
        text: &str,
        operation: Operation,
        deterministic: bool,
    ) -> EngineResult<Value> {
        match operation {
            Operation::Encrypt => Ok(Value::String(self.encryptor.encrypt_str(text, deterministic)?)),
            Operation::Decrypt => {
                let plain = self.encryptor.decrypt_str(text, deterministic)?;
                Ok(tagged_scalar(&plain).unwrap_or(Value::String(plain)))
            }
        }
    }

    /// The new value of a field carrying `directive`.
    ///
    /// A named handler owns the transform; otherwise the primitive path runs
    /// with the directive's deterministic flag. The decrypt-only flag is not
    /// consulted here.
    pub fn apply(
        &self,
        directive: &Encrypted,
        value: Value,
        operation: Operation,
    ) -> EngineResult<Value> {
        match &directive.handler {
            Some(handler_ref) => {
                let handler = self.handlers.resolve(handler_ref)?;
                handler
                    .handle(self.encryptor.as_ref(), value, operation)
                    .map_err(|reason| EngineError::Handler {
                        handler: handler_ref.clone(),
                        reason,
                    })
            }
            None => self.transform_value(&value, operation, directive.deterministic),
        }
    }

    /// Transform of one field of `object`.
    ///
    /// Returns `None` when the field must be left untouched, which is the
    /// case for decrypt-only fields on the encrypt path.
    pub fn transform(
        &self,
        object: &dyn Persistable,
        field: &str,
        directive: &Encrypted,
        operation: Operation,
    ) -> EngineResult<Option<Value>> {
        if !directive.applies_to(operation) {
            return Ok(None);
        }
        let current = object.get_field(field)?;
        self.apply(directive, current, operation).map(Some)
    }
}

/// The boolean or number encoded by tagged plaintext.
fn tagged_scalar(plain: &str) -> Option<Value> {
    let text = plain.strip_prefix(SCALAR_TAG)?;
    match serde_json::from_str(text).ok()? {
        scalar @ (Value::Bool(_) | Value::Number(_)) => Some(scalar),
        _ => None,
    }
}

impl fmt::Debug for ValueTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTransformer")
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
