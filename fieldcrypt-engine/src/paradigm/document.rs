use super::Paradigm;
use crate::context::{tracked, tracked_mut, LifecycleEvent, ObjectId, PersistenceContext};
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::wrapper::ObjectWrapper;
use fieldcrypt_model::{ModelError, Operation};
use serde_json::Value;
use tracing::debug;

/// Document-store persistence: encrypts scheduled updates on flush and
/// rewrites snapshots after loads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Document;

const ENCRYPT_EVENTS: &[LifecycleEvent] = &[
    LifecycleEvent::BeforeInsert,
    LifecycleEvent::BeforeUpdate,
    LifecycleEvent::OnFlush,
];

impl Paradigm for Document {
    fn name(&self) -> &'static str {
        "document"
    }

    fn encrypt_events(&self) -> &'static [LifecycleEvent] {
        ENCRYPT_EVENTS
    }

    fn before_insert(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        ObjectWrapper::new(ctx, id, Operation::Encrypt)?.process(engine)?;
        Ok(())
    }

    fn before_update(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        let mut wrapper = ObjectWrapper::new(ctx, id, Operation::Encrypt)?;
        wrapper.process(engine)?;
        if !wrapper.context().is_scheduled_for_delete(id) {
            wrapper.context_mut().recompute_change_set(id)?;
        }
        Ok(())
    }

    /// Decrypts, then rewrites the snapshot to the decrypted values so the
    /// next dirty-check compares plaintext with plaintext.
    fn after_load(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        let mut wrapper = ObjectWrapper::new(ctx, id, Operation::Decrypt)?;
        if !wrapper.process(engine)? {
            return Ok(());
        }

        let object = wrapper.object()?;
        let identifier = engine.resolver().resolve(object).identifier().map(str::to_string);
        let names: Vec<String> = wrapper
            .context()
            .original_data(id)
            .map(|snapshot| snapshot.keys().cloned().collect())
            .unwrap_or_default();

        let mut rewrites: Vec<(String, Value)> = Vec::with_capacity(names.len());
        for name in names {
            if identifier.as_deref() == Some(name.as_str()) {
                continue;
            }
            match object.get_field(&name) {
                Ok(value) => rewrites.push((name, value)),
                Err(ModelError::UnknownField { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        for (name, value) in rewrites {
            wrapper.context_mut().set_original_value(id, &name, value);
        }
        Ok(())
    }

    /// Encrypts each scheduled update, recomputes its change set, then
    /// restores the plaintext so the object stays usable in memory. The
    /// plaintext is restored even when recomputing fails.
    fn on_flush(&self, engine: &Engine, ctx: &mut dyn PersistenceContext) -> EngineResult<()> {
        for id in ctx.scheduled_updates() {
            let object = tracked(&*ctx, id)?;
            let directives = engine.resolver().resolve(object);
            if directives.is_empty() {
                continue;
            }
            let plaintext = directives
                .fields()
                .iter()
                .map(|field| Ok((field.name.clone(), object.get_field(&field.name)?)))
                .collect::<EngineResult<Vec<_>>>()?;

            engine.process_fields(tracked_mut(ctx, id)?, Operation::Encrypt)?;
            let recomputed = ctx.recompute_change_set(id);

            let object = tracked_mut(ctx, id)?;
            for (name, value) in plaintext {
                object.set_field(&name, value)?;
            }
            recomputed?;
            debug!(object = %id, "Encrypted change set of scheduled update");
        }
        Ok(())
    }
}
