use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Direction of a field transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    /// Lowercase name, as handed to custom field handlers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
        }
    }

    pub fn is_encrypt(&self) -> bool {
        matches!(self, Self::Encrypt)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names an externally registered handler that takes over a field's transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerRef {
    pub service: String,
    pub method: String,
}

impl HandlerRef {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.service, self.method)
    }
}

/// The encryption directive attached to a field.
///
/// Directives are part of a type's static schema, never of instance state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encrypted {
    /// Use a zero IV so equal plaintexts give equal (searchable) ciphertexts.
    #[serde(default)]
    pub deterministic: bool,
    /// Decrypt on load, never re-encrypt on write.
    #[serde(default, alias = "decrypt")]
    pub decrypt_only: bool,
    /// Custom handler owning the transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerRef>,
}

impl Encrypted {
    /// Random IV per encryption.
    pub fn random() -> Self {
        Self::default()
    }

    /// Zero IV, equal plaintexts give equal ciphertexts.
    pub fn deterministic() -> Self {
        Self {
            deterministic: true,
            ..Self::default()
        }
    }

    /// Marks the field decrypt-only.
    pub fn decrypt_only(mut self) -> Self {
        self.decrypt_only = true;
        self
    }

    /// Delegates the transform to `service::method`.
    pub fn with_handler(mut self, service: impl Into<String>, method: impl Into<String>) -> Self {
        self.handler = Some(HandlerRef::new(service, method));
        self
    }

    /// Parses annotation-style options.
    ///
    /// Recognized keys are `deterministic`, `decrypt`, `handlerService` and
    /// `handlerMethod`. Flags count only when literally `true`; a handler is
    /// only set when both service and method are strings.
    pub fn from_options(options: &Map<String, Value>) -> Self {
        let flag = |key: &str| matches!(options.get(key), Some(Value::Bool(true)));
        let text = |key: &str| options.get(key).and_then(Value::as_str).map(str::to_string);

        let handler = match (text("handlerService"), text("handlerMethod")) {
            (Some(service), Some(method)) => Some(HandlerRef { service, method }),
            _ => None,
        };

        Self {
            deterministic: flag("deterministic"),
            decrypt_only: flag("decrypt"),
            handler,
        }
    }

    /// Whether a transform in direction `operation` touches the field.
    pub fn applies_to(&self, operation: Operation) -> bool {
        !(self.decrypt_only && operation.is_encrypt())
    }
}
