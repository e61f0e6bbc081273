//! Shared engine state and the per-object operations every paradigm uses.

use crate::context::{tracked, tracked_mut, ObjectId, PersistenceContext};
use crate::error::{EngineError, EngineResult};
use crate::handler::HandlerRegistry;
use crate::registry::DecodedRegistry;
use crate::transform::ValueTransformer;
use fieldcrypt_crypto::Encryptor;
use fieldcrypt_model::{identifier_text, DirectiveResolver, Operation, Persistable};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Encryptor, handlers and directive cache.
///
/// One engine is shared by every interceptor of a process; its caches are
/// safe to use from several threads. Decoded-object bookkeeping lives with
/// each persistence context, see [`PersistenceContext::decoded`].
#[derive(Debug)]
pub struct Engine {
    transformer: ValueTransformer,
    resolver: Arc<DirectiveResolver>,
}

impl Engine {
    pub fn new(encryptor: Arc<dyn Encryptor>, handlers: HandlerRegistry) -> Self {
        Self::with_stores(
            encryptor,
            Arc::new(handlers),
            Arc::new(DirectiveResolver::new()),
        )
    }

    /// Builds an engine around caller-owned caches.
    pub fn with_stores(
        encryptor: Arc<dyn Encryptor>,
        handlers: Arc<HandlerRegistry>,
        resolver: Arc<DirectiveResolver>,
    ) -> Self {
        Self {
            transformer: ValueTransformer::new(encryptor, handlers),
            resolver,
        }
    }

    pub fn transformer(&self) -> &ValueTransformer {
        &self.transformer
    }

    pub fn resolver(&self) -> &DirectiveResolver {
        &self.resolver
    }

    /// Transforms every eligible encrypted field of `object` in place.
    ///
    /// New values are computed for all fields before any is written, so a
    /// failing field leaves the object untouched. Returns whether the type
    /// has encrypted fields at all.
    pub fn process_fields(
        &self,
        object: &mut dyn Persistable,
        operation: Operation,
    ) -> EngineResult<bool> {
        let directives = self.resolver.resolve(object);
        if directives.is_empty() {
            return Ok(false);
        }

        let mut updates = Vec::with_capacity(directives.fields().len());
        for field in directives.fields() {
            if let Some(value) =
                self.transformer
                    .transform(object, &field.name, &field.directive, operation)?
            {
                updates.push((field.name.as_str(), value));
            }
        }

        let written = updates.len();
        for (name, value) in updates {
            object.set_field(name, value)?;
        }
        debug!(
            entity_type = directives.entity_type(),
            %operation,
            fields = written,
            "Processed encrypted fields"
        );
        Ok(true)
    }

    /// Encrypts a tracked object in place and drops it from the context's
    /// decoded registry.
    pub fn encrypt_object(
        &self,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<bool> {
        let had_fields = self.process_fields(tracked_mut(ctx, id)?, Operation::Encrypt)?;
        if had_fields {
            self.forget_decoded(ctx.decoded(), tracked(&*ctx, id)?);
        }
        Ok(had_fields)
    }

    /// Decrypts a tracked object in place unless the context already records
    /// it as decoded.
    ///
    /// Returns whether fields were decrypted.
    pub fn decrypt_object(
        &self,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<bool> {
        let object = tracked(&*ctx, id)?;
        if self.is_decoded(ctx.decoded(), object) {
            debug!(entity_type = object.entity_type(), object = %id, "Object already decoded");
            return Ok(false);
        }
        let had_fields = self.process_fields(tracked_mut(ctx, id)?, Operation::Decrypt)?;
        if had_fields {
            self.mark_decoded(ctx.decoded(), tracked(&*ctx, id)?);
        }
        Ok(had_fields)
    }

    /// Transformed value of one encrypted field, without writing it back.
    ///
    /// Returns `None` for fields without a directive.
    pub fn field_value(
        &self,
        object: &dyn Persistable,
        name: &str,
        operation: Operation,
    ) -> EngineResult<Option<Value>> {
        let directives = self.resolver.resolve(object);
        let Some(directive) = directives.directive(name) else {
            return Ok(None);
        };
        let current = object.get_field(name)?;
        self.transformer.apply(directive, current, operation).map(Some)
    }

    /// Raw current value of an encrypted field, `None` for other fields.
    pub fn unchanged_value(
        &self,
        object: &dyn Persistable,
        name: &str,
    ) -> EngineResult<Option<Value>> {
        if !self.resolver.is_field_encrypted(object, name) {
            return Ok(None);
        }
        Ok(Some(object.get_field(name)?))
    }

    /// The object-wide deterministic flag used by reconciliation.
    pub fn is_deterministic(&self, object: &dyn Persistable) -> bool {
        self.resolver.resolve(object).first_deterministic()
    }

    pub fn has_encrypted_fields(&self, object: &dyn Persistable) -> bool {
        self.resolver.has_encrypted_fields(object)
    }

    pub fn is_decoded(&self, registry: &DecodedRegistry, object: &dyn Persistable) -> bool {
        match self.registry_key(object) {
            Ok(Some((entity_type, id))) => registry.contains(&entity_type, &id),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Skipping decoded registry lookup");
                false
            }
        }
    }

    pub fn mark_decoded(&self, registry: &DecodedRegistry, object: &dyn Persistable) {
        match self.registry_key(object) {
            Ok(Some((entity_type, id))) => {
                registry.insert(&entity_type, &id);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping decoded registry insert"),
        }
    }

    pub fn forget_decoded(&self, registry: &DecodedRegistry, object: &dyn Persistable) {
        match self.registry_key(object) {
            Ok(Some((entity_type, id))) => {
                registry.remove(&entity_type, &id);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping decoded registry removal"),
        }
    }

    /// Clears the per-unit-of-work state held by `ctx`.
    pub fn end_unit_of_work(&self, ctx: &dyn PersistenceContext) {
        let registry = ctx.decoded();
        debug!(decoded = registry.len(), "Clearing decoded registry");
        registry.clear();
    }

    /// Registry key of `object`. `Ok(None)` when the identifier has no value yet.
    fn registry_key(&self, object: &dyn Persistable) -> EngineResult<Option<(String, String)>> {
        let directives = self.resolver.resolve(object);
        let unsupported =
            || EngineError::UnsupportedIdentifierMapping(directives.entity_type().to_string());
        let name = directives.identifier().ok_or_else(unsupported)?;
        let value = object.get_field(name).map_err(|_| unsupported())?;
        match value {
            Value::Null => Ok(None),
            other => identifier_text(&other)
                .map(|id| Some((directives.entity_type().to_string(), id)))
                .ok_or_else(unsupported),
        }
    }
}
