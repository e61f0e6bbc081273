use crate::directive::Encrypted;
use serde::{Deserialize, Serialize};

/// Describes a persisted type's fields and which of them are encrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    /// Name of the single identifier field, if the type has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<Encrypted>,
}

impl FieldSpec {
    /// A field stored as is.
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.into(),
            encrypted: None,
        }
    }

    /// A field carrying an encryption directive.
    pub fn encrypted(name: &str, directive: Encrypted) -> Self {
        Self {
            name: name.into(),
            encrypted: Some(directive),
        }
    }
}

impl EntitySchema {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            identifier: None,
            fields: Vec::new(),
        }
    }

    /// Starts a schema for a subtype: the parent's fields come first and the
    /// parent's identifier is inherited.
    pub fn extending(entity_type: &str, parent: &EntitySchema) -> Self {
        Self {
            entity_type: entity_type.into(),
            identifier: parent.identifier.clone(),
            fields: parent.fields.clone(),
        }
    }

    /// Declares the identifier field (as a plain field).
    pub fn with_identifier(mut self, name: &str) -> Self {
        self.identifier = Some(name.into());
        self.with_field(FieldSpec::plain(name))
    }

    /// Adds a field. Redeclaring a name replaces the earlier declaration in place.
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Adds a plain field.
    pub fn plain(self, name: &str) -> Self {
        self.with_field(FieldSpec::plain(name))
    }

    /// Adds an encrypted field.
    pub fn encrypted(self, name: &str, directive: Encrypted) -> Self {
        self.with_field(FieldSpec::encrypted(name, directive))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Fields carrying a directive, in declaration order.
    pub fn encrypted_fields(&self) -> impl Iterator<Item = (&str, &Encrypted)> {
        self.fields
            .iter()
            .filter_map(|f| f.encrypted.as_ref().map(|d| (f.name.as_str(), d)))
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier.as_deref() == Some(name)
    }
}
