//! Lifecycle interceptors.
//!
//! An [`Interceptor`] binds a paradigm and a direction to a shared
//! [`Engine`]. Hosts hand every lifecycle event to
//! [`LifecycleListener::notify`]; events outside the interceptor's
//! subscription are ignored.

use crate::context::{EventArgs, LifecycleEvent, PersistenceContext};
use crate::engine::Engine;
use crate::error::EngineResult;
use crate::paradigm::{Direction, Document, Paradigm, Relational};
use std::sync::Arc;
use tracing::trace;

/// Receiver of host lifecycle events.
pub trait LifecycleListener {
    fn notify(
        &self,
        event: LifecycleEvent,
        ctx: &mut dyn PersistenceContext,
        args: &EventArgs,
    ) -> EngineResult<()>;

    /// Called when the host's unit of work is cleared.
    fn end_unit_of_work(&self, _ctx: &dyn PersistenceContext) {}
}

/// Paradigm hooks for one direction, backed by a shared engine.
#[derive(Debug, Clone)]
pub struct Interceptor {
    engine: Arc<Engine>,
    paradigm: Arc<dyn Paradigm>,
    direction: Direction,
}

impl Interceptor {
    pub fn new(engine: Arc<Engine>, paradigm: Arc<dyn Paradigm>, direction: Direction) -> Self {
        Self {
            engine,
            paradigm,
            direction,
        }
    }

    pub fn relational(engine: Arc<Engine>, direction: Direction) -> Self {
        Self::new(engine, Arc::new(Relational), direction)
    }

    pub fn document(engine: Arc<Engine>, direction: Direction) -> Self {
        Self::new(engine, Arc::new(Document), direction)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn paradigm(&self) -> &dyn Paradigm {
        self.paradigm.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn subscribed_events(&self) -> Vec<LifecycleEvent> {
        self.paradigm.events(self.direction)
    }

    pub fn is_subscribed(&self, event: LifecycleEvent) -> bool {
        self.subscribed_events().contains(&event)
    }

    /// Runs the hook for `event` regardless of subscription.
    ///
    /// Fails with `InvalidLifecycleArgument` when `args` has the wrong shape.
    pub fn handle(
        &self,
        event: LifecycleEvent,
        ctx: &mut dyn PersistenceContext,
        args: &EventArgs,
    ) -> EngineResult<()> {
        let engine = self.engine.as_ref();
        let paradigm = self.paradigm.as_ref();
        match event {
            LifecycleEvent::BeforeInsert => paradigm.before_insert(engine, ctx, args.object(event)?),
            LifecycleEvent::BeforeUpdate => paradigm.before_update(engine, ctx, args.update(event)?),
            LifecycleEvent::AfterLoad => paradigm.after_load(engine, ctx, args.object(event)?),
            LifecycleEvent::AfterInsert => paradigm.after_insert(engine, ctx, args.object(event)?),
            LifecycleEvent::AfterUpdate => paradigm.after_update(engine, ctx, args.object(event)?),
            LifecycleEvent::PreFlush => {
                args.flush(event)?;
                paradigm.pre_flush(engine, ctx)
            }
            LifecycleEvent::OnFlush => {
                args.flush(event)?;
                paradigm.on_flush(engine, ctx)
            }
        }
    }
}

impl LifecycleListener for Interceptor {
    fn notify(
        &self,
        event: LifecycleEvent,
        ctx: &mut dyn PersistenceContext,
        args: &EventArgs,
    ) -> EngineResult<()> {
        if !self.is_subscribed(event) {
            return Ok(());
        }
        trace!(
            paradigm = self.paradigm.name(),
            direction = ?self.direction,
            %event,
            "Intercepting lifecycle event"
        );
        self.handle(event, ctx, args)
    }

    fn end_unit_of_work(&self, ctx: &dyn PersistenceContext) {
        self.engine.end_unit_of_work(ctx);
    }
}

/// Interceptors notified in registration order.
#[derive(Debug, Clone, Default)]
pub struct Subscribers {
    interceptors: Vec<Interceptor>,
}

impl Subscribers {
    pub fn new(interceptors: Vec<Interceptor>) -> Self {
        Self { interceptors }
    }

    pub fn push(&mut self, interceptor: Interceptor) {
        self.interceptors.push(interceptor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interceptor> {
        self.interceptors.iter()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl LifecycleListener for Subscribers {
    fn notify(
        &self,
        event: LifecycleEvent,
        ctx: &mut dyn PersistenceContext,
        args: &EventArgs,
    ) -> EngineResult<()> {
        for interceptor in &self.interceptors {
            interceptor.notify(event, ctx, args)?;
        }
        Ok(())
    }

    fn end_unit_of_work(&self, ctx: &dyn PersistenceContext) {
        for interceptor in &self.interceptors {
            interceptor.end_unit_of_work(ctx);
        }
    }
}
