//! The contract between the engine and a host persistence framework.

use crate::error::{EngineError, EngineResult};
use crate::registry::DecodedRegistry;
use fieldcrypt_model::Persistable;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Handle of a tracked object inside a persistence context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Field name to last-persisted value.
pub type Snapshot = Map<String, Value>;

/// One modified field, as the host's dirty-checker sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Modified fields of one object.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// Operations the engine needs from the host's unit of work.
pub trait PersistenceContext {
    fn object(&self, id: ObjectId) -> Option<&dyn Persistable>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut (dyn Persistable + 'static)>;

    /// Every object currently tracked.
    fn identity_map(&self) -> Vec<ObjectId>;

    /// The snapshot the dirty-checker compares against.
    fn original_data(&self, id: ObjectId) -> Option<&Snapshot>;

    /// Overwrites one snapshot entry.
    fn set_original_value(&mut self, id: ObjectId, field: &str, value: Value);

    /// The change set computed for the object, if any.
    fn change_set(&self, id: ObjectId) -> Option<&ChangeSet>;

    /// Diffs the object's current values against its snapshot again.
    fn recompute_change_set(&mut self, id: ObjectId) -> EngineResult<()>;

    fn is_scheduled_for_update(&self, id: ObjectId) -> bool;

    fn is_scheduled_for_delete(&self, id: ObjectId) -> bool;

    /// Objects the current flush will update.
    fn scheduled_updates(&self) -> Vec<ObjectId>;

    /// Objects already decrypted in this unit of work.
    ///
    /// Owned by the context, so units of work sharing an engine never see
    /// each other's entries.
    fn decoded(&self) -> &DecodedRegistry;
}

/// Looks up an object, failing for unknown handles.
pub(crate) fn tracked(ctx: &dyn PersistenceContext, id: ObjectId) -> EngineResult<&dyn Persistable> {
    ctx.object(id).ok_or(EngineError::UnknownObject(id))
}

/// Mutable variant of [`tracked`].
pub(crate) fn tracked_mut(
    ctx: &mut dyn PersistenceContext,
    id: ObjectId,
) -> EngineResult<&mut (dyn Persistable + 'static)> {
    ctx.object_mut(id).ok_or(EngineError::UnknownObject(id))
}

/// Lifecycle events raised by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    BeforeInsert,
    BeforeUpdate,
    AfterLoad,
    AfterInsert,
    AfterUpdate,
    PreFlush,
    OnFlush,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeInsert => "before_insert",
            Self::BeforeUpdate => "before_update",
            Self::AfterLoad => "after_load",
            Self::AfterInsert => "after_insert",
            Self::AfterUpdate => "after_update",
            Self::PreFlush => "pre_flush",
            Self::OnFlush => "on_flush",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments carried by a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventArgs {
    /// Insert, load and post-write events.
    Object(ObjectId),
    /// Pre-update events, raised while the object's change set is available.
    Update(ObjectId),
    /// Flush-wide events.
    Flush,
}

impl EventArgs {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Update(_) => "update",
            Self::Flush => "flush",
        }
    }

    /// The object of an `Object` argument.
    pub fn object(&self, event: LifecycleEvent) -> EngineResult<ObjectId> {
        match self {
            Self::Object(id) => Ok(*id),
            other => Err(other.mismatch(event, "object")),
        }
    }

    /// The object of an `Update` argument.
    pub fn update(&self, event: LifecycleEvent) -> EngineResult<ObjectId> {
        match self {
            Self::Update(id) => Ok(*id),
            other => Err(other.mismatch(event, "update")),
        }
    }

    /// Checks for a `Flush` argument.
    pub fn flush(&self, event: LifecycleEvent) -> EngineResult<()> {
        match self {
            Self::Flush => Ok(()),
            other => Err(other.mismatch(event, "flush")),
        }
    }

    fn mismatch(&self, event: LifecycleEvent, expected: &'static str) -> EngineError {
        EngineError::InvalidLifecycleArgument {
            event,
            expected,
            actual: self.kind(),
        }
    }
}
