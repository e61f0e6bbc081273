use super::Paradigm;
use crate::context::{tracked, LifecycleEvent, ObjectId, PersistenceContext};
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::reconcile::{pin_encrypted_originals, reconcile};

/// Table-backed persistence: reconciles on pre-flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relational;

const ENCRYPT_EVENTS: &[LifecycleEvent] = &[
    LifecycleEvent::BeforeInsert,
    LifecycleEvent::BeforeUpdate,
    LifecycleEvent::PreFlush,
];

impl Paradigm for Relational {
    fn name(&self) -> &'static str {
        "relational"
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
        engine.encrypt_object(ctx, id)?;
        reconcile(engine, ctx)?;
        Ok(())
    }

    fn before_update(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        engine.encrypt_object(ctx, id)?;

        if ctx.is_scheduled_for_update(id) {
            let directives = engine.resolver().resolve(tracked(&*ctx, id)?);
            let touches_encrypted = ctx
                .change_set(id)
                .is_some_and(|changes| changes.keys().any(|f| directives.is_encrypted(f)));
            if !touches_encrypted {
                pin_encrypted_originals(engine, ctx, id)?;
            }
        }

        if !ctx.is_scheduled_for_delete(id) {
            ctx.recompute_change_set(id)?;
        }
        Ok(())
    }

    fn after_load(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        engine.decrypt_object(ctx, id)?;
        Ok(())
    }

    fn pre_flush(&self, engine: &Engine, ctx: &mut dyn PersistenceContext) -> EngineResult<()> {
        reconcile(engine, ctx)?;
        Ok(())
    }
}
