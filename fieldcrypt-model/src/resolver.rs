//! Per-type directive lookup with a read-mostly cache.

use crate::directive::{Encrypted, Operation};
use crate::entity::Persistable;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// An encrypted field and its directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub directive: Encrypted,
}

/// Directives of one type, derived once from its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDirectives {
    entity_type: String,
    identifier: Option<String>,
    fields: Vec<ResolvedField>,
}

impl TypeDirectives {
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Name of the identifier field, if the type maps one.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Encrypted fields in declaration order.
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn directive(&self, name: &str) -> Option<&Encrypted> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.directive)
    }

    pub fn is_encrypted(&self, name: &str) -> bool {
        self.directive(name).is_some()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// The deterministic flag of the first directive that is not decrypt-only.
    ///
    /// Reconciliation uses this one flag for every field of the object, so an
    /// object mixing deterministic and random fields is compared using the
    /// first field's mode.
    pub fn first_deterministic(&self) -> bool {
        self.fields
            .iter()
            .find(|f| f.directive.applies_to(Operation::Encrypt))
            .is_some_and(|f| f.directive.deterministic)
    }
}

/// Resolves which fields of an object are encrypted.
///
/// Results are cached per type name; field values are never cached.
#[derive(Debug, Default)]
pub struct DirectiveResolver {
    cache: RwLock<HashMap<String, Arc<TypeDirectives>>>,
}

impl DirectiveResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives for the object's type, computed on first use.
    pub fn resolve(&self, object: &dyn Persistable) -> Arc<TypeDirectives> {
        if let Some(found) = self.cache.read().get(object.entity_type()) {
            return Arc::clone(found);
        }

        let schema = object.schema();
        let directives = Arc::new(TypeDirectives {
            entity_type: schema.entity_type.clone(),
            identifier: schema.identifier.clone(),
            fields: schema
                .encrypted_fields()
                .map(|(name, directive)| ResolvedField {
                    name: name.to_string(),
                    directive: directive.clone(),
                })
                .collect(),
        });
        debug!(
            entity_type = %directives.entity_type,
            encrypted_fields = directives.fields.len(),
            "Resolved field directives"
        );

        let mut cache = self.cache.write();
        Arc::clone(
            cache
                .entry(object.entity_type().to_string())
                .or_insert(directives),
        )
    }

    /// Encrypted fields of the object, in declaration order.
    pub fn fields_of(&self, object: &dyn Persistable) -> Vec<ResolvedField> {
        self.resolve(object).fields().to_vec()
    }

    pub fn is_field_encrypted(&self, object: &dyn Persistable, name: &str) -> bool {
        self.resolve(object).is_encrypted(name)
    }

    pub fn encrypted_field_names(&self, object: &dyn Persistable) -> BTreeSet<String> {
        self.resolve(object).names()
    }

    pub fn has_encrypted_fields(&self, object: &dyn Persistable) -> bool {
        !self.resolve(object).is_empty()
    }

    /// Number of types currently cached.
    pub fn cached_types(&self) -> usize {
        self.cache.read().len()
    }

    /// Drops every cached type.
    pub fn clear(&self) {
        self.cache.write().clear();
    }
}
