//! Custom field handlers.
//!
//! A field whose directive names a [`HandlerRef`] is transformed by the
//! registered handler instead of the built-in primitive path.

use crate::error::{EngineError, EngineResult};
use fieldcrypt_crypto::Encryptor;
use fieldcrypt_model::{HandlerRef, Operation};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Owns the transform of fields that name it.
///
/// Return `Err(message)` to abort the surrounding persistence operation.
pub trait FieldHandler: Send + Sync {
    fn handle(
        &self,
        encryptor: &dyn Encryptor,
        value: Value,
        operation: Operation,
    ) -> Result<Value, String>;
}

impl<F> FieldHandler for F
where
    F: Fn(&dyn Encryptor, Value, Operation) -> Result<Value, String> + Send + Sync,
{
    fn handle(
        &self,
        encryptor: &dyn Encryptor,
        value: Value,
        operation: Operation,
    ) -> Result<Value, String> {
        self(encryptor, value, operation)
    }
}

/// Handlers by service and method name.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    services: HashMap<String, HashMap<String, Arc<dyn FieldHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` as `service::method`, replacing any previous one.
    pub fn register(
        &mut self,
        service: impl Into<String>,
        method: impl Into<String>,
        handler: impl FieldHandler + 'static,
    ) -> &mut Self {
        self.services
            .entry(service.into())
            .or_default()
            .insert(method.into(), Arc::new(handler));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(
        mut self,
        service: impl Into<String>,
        method: impl Into<String>,
        handler: impl FieldHandler + 'static,
    ) -> Self {
        self.register(service, method, handler);
        self
    }

    pub fn contains(&self, handler: &HandlerRef) -> bool {
        self.services
            .get(&handler.service)
            .is_some_and(|methods| methods.contains_key(&handler.method))
    }

    /// Looks up a handler; an unknown service or method is not callable.
    pub fn resolve(&self, handler: &HandlerRef) -> EngineResult<Arc<dyn FieldHandler>> {
        self.services
            .get(&handler.service)
            .and_then(|methods| methods.get(&handler.method))
            .cloned()
            .ok_or_else(|| EngineError::HandlerNotCallable(handler.clone()))
    }

    pub fn len(&self) -> usize {
        self.services.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .services
            .iter()
            .flat_map(|(service, methods)| {
                methods.keys().map(move |method| format!("{service}::{method}"))
            })
            .collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}
