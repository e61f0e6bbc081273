//! Persistence paradigms.
//!
//! Relational and document persistence differ in which flush hook they use
//! for reconciliation and in how they fix up snapshots after a load. Each
//! paradigm is a strategy the [`Interceptor`](crate::Interceptor) dispatches
//! to; argument validation happens before these methods are reached.

mod document;
mod relational;

pub use document::Document;
pub use relational::Relational;

use crate::context::{LifecycleEvent, ObjectId, PersistenceContext};
use crate::engine::Engine;
use crate::error::EngineResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half of the lifecycle an interceptor subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Encrypt,
    Decrypt,
    Both,
}

impl Direction {
    pub fn encrypts(&self) -> bool {
        matches!(self, Self::Encrypt | Self::Both)
    }

    pub fn decrypts(&self) -> bool {
        matches!(self, Self::Decrypt | Self::Both)
    }
}

/// Events every paradigm handles on the decrypt side.
pub const DECRYPT_EVENTS: &[LifecycleEvent] = &[
    LifecycleEvent::AfterLoad,
    LifecycleEvent::AfterUpdate,
    LifecycleEvent::AfterInsert,
];

/// Hook implementations of one persistence paradigm.
pub trait Paradigm: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Events handled on the encrypt side.
    fn encrypt_events(&self) -> &'static [LifecycleEvent];

    /// Events handled on the decrypt side.
    fn decrypt_events(&self) -> &'static [LifecycleEvent] {
        DECRYPT_EVENTS
    }

    /// Events an interceptor with `direction` subscribes to.
    fn events(&self, direction: Direction) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        if direction.encrypts() {
            events.extend_from_slice(self.encrypt_events());
        }
        if direction.decrypts() {
            events.extend_from_slice(self.decrypt_events());
        }
        events
    }

    fn before_insert(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()>;

    fn before_update(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()>;

    fn after_load(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()>;

    /// Freshly written objects hold ciphertext; decrypt them like a load.
    fn after_insert(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        self.after_load(engine, ctx, id)
    }

    fn after_update(
        &self,
        engine: &Engine,
        ctx: &mut dyn PersistenceContext,
        id: ObjectId,
    ) -> EngineResult<()> {
        self.after_load(engine, ctx, id)
    }

    fn pre_flush(&self, engine: &Engine, ctx: &mut dyn PersistenceContext) -> EngineResult<()> {
        let _ = (engine, ctx);
        Ok(())
    }

    fn on_flush(&self, engine: &Engine, ctx: &mut dyn PersistenceContext) -> EngineResult<()> {
        let _ = (engine, ctx);
        Ok(())
    }
}
