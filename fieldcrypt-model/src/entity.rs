use crate::error::{ModelError, ModelResult};
use crate::schema::EntitySchema;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Field-level access to a persisted object.
///
/// This is the seam the engine reads and writes fields through. Implementors
/// expose every declared field by name, private ones included, as a JSON value.
pub trait Persistable: Send {
    /// Runtime type name. Directive lookups are cached per type name, so
    /// every instance of one type must report the same schema.
    fn entity_type(&self) -> &str;

    /// Static field metadata for this type.
    fn schema(&self) -> EntitySchema;

    /// Reads a field's current value.
    fn get_field(&self, name: &str) -> ModelResult<Value>;

    /// Overwrites a field's value.
    fn set_field(&mut self, name: &str, value: Value) -> ModelResult<()>;
}

/// A schema-driven object whose fields live in a JSON map.
///
/// Suitable for document-shaped data where a Rust struct per type is not
/// wanted. Only fields declared in the schema can be written.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<EntitySchema>,
    data: Map<String, Value>,
}

impl Entity {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            data: Map::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> ModelResult<Self> {
        self.set_field(name, value.into())?;
        Ok(self)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Extract a string value using a JSON pointer (e.g., "/email").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a numeric value using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.pointer(pointer).and_then(|v| v.as_f64())
    }

    fn pointer(&self, pointer: &str) -> Option<&Value> {
        let (head, rest) = match pointer.trim_start_matches('/').split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (pointer.trim_start_matches('/'), None),
        };
        let value = self.data.get(head)?;
        match rest {
            Some(rest) => value.pointer(&format!("/{rest}")),
            None => Some(value),
        }
    }
}

impl Persistable for Entity {
    fn entity_type(&self) -> &str {
        &self.schema.entity_type
    }

    fn schema(&self) -> EntitySchema {
        self.schema.as_ref().clone()
    }

    fn get_field(&self, name: &str) -> ModelResult<Value> {
        if !self.schema.has_field(name) {
            return Err(ModelError::unknown_field(&self.schema.entity_type, name));
        }
        Ok(self.data.get(name).cloned().unwrap_or(Value::Null))
    }

    fn set_field(&mut self, name: &str, value: Value) -> ModelResult<()> {
        if !self.schema.has_field(name) {
            return Err(ModelError::unknown_field(&self.schema.entity_type, name));
        }
        self.data.insert(name.to_string(), value);
        Ok(())
    }
}

/// Canonical text of an identifier value, for use as a registry key.
///
/// Strings and numbers qualify; null, booleans and containers do not.
pub fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
