//! An in-memory unit of work implementing [`PersistenceContext`].
//!
//! Drives lifecycle events in the order a mapper does and stores rows in a
//! map, so the engine can be exercised end to end without a database.

use crate::context::{
    ChangeSet, EventArgs, FieldChange, LifecycleEvent, ObjectId, PersistenceContext, Snapshot,
};
use crate::error::{EngineError, EngineResult};
use crate::interceptor::LifecycleListener;
use crate::registry::DecodedRegistry;
use fieldcrypt_model::{identifier_text, Persistable};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Kind of a row write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// A row write performed by [`InMemoryUnitOfWork::flush`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub id: ObjectId,
    pub kind: WriteKind,
    /// Columns written; empty for deletes.
    pub values: Snapshot,
}

struct Tracked {
    object: Box<dyn Persistable>,
    fields: Vec<String>,
    row_key: (String, String),
    original: Snapshot,
    change_set: ChangeSet,
}

/// Identity map, snapshots, schedules and a row store.
#[derive(Default)]
pub struct InMemoryUnitOfWork {
    next_id: u64,
    objects: BTreeMap<ObjectId, Tracked>,
    inserts: Vec<ObjectId>,
    updates: BTreeSet<ObjectId>,
    deletes: BTreeSet<ObjectId>,
    rows: BTreeMap<(String, String), Snapshot>,
    writes: Vec<WriteRecord>,
    decoded: DecodedRegistry,
}

impl InMemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a row directly, as if written by an earlier process.
    pub fn seed_row(&mut self, entity_type: &str, id: &str, row: Snapshot) {
        self.rows
            .insert((entity_type.to_string(), id.to_string()), row);
    }

    pub fn row(&self, entity_type: &str, id: &str) -> Option<&Snapshot> {
        self.rows.get(&(entity_type.to_string(), id.to_string()))
    }

    /// Row writes performed so far, oldest first.
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Typed read access for callers that know the concrete type.
    pub fn get(&self, id: ObjectId) -> Option<&dyn Persistable> {
        self.object(id)
    }

    /// Applies `edit` to a tracked object.
    pub fn modify<F>(&mut self, id: ObjectId, edit: F) -> EngineResult<()>
    where
        F: FnOnce(&mut dyn Persistable) -> EngineResult<()>,
    {
        let tracked = self
            .objects
            .get_mut(&id)
            .ok_or(EngineError::UnknownObject(id))?;
        edit(tracked.object.as_mut())
    }

    /// Starts tracking a new object and raises before-insert.
    pub fn persist<L>(
        &mut self,
        object: Box<dyn Persistable>,
        listener: &L,
    ) -> EngineResult<ObjectId>
    where
        L: LifecycleListener + ?Sized,
    {
        let id = self.track(object, Snapshot::new())?;
        self.inserts.push(id);
        listener.notify(LifecycleEvent::BeforeInsert, self, &EventArgs::Object(id))?;
        Ok(id)
    }

    /// Hydrates `object` from its stored row and raises after-load.
    ///
    /// The object's identifier field selects the row. Returns `None` when no
    /// row exists. An object already in the identity map is returned as is.
    pub fn load<L>(
        &mut self,
        mut object: Box<dyn Persistable>,
        listener: &L,
    ) -> EngineResult<Option<ObjectId>>
    where
        L: LifecycleListener + ?Sized,
    {
        let key = Self::key_of(object.as_ref(), None)?;
        if let Some(existing) = self
            .objects
            .iter()
            .find(|(_, tracked)| tracked.row_key == key)
            .map(|(id, _)| *id)
        {
            return Ok(Some(existing));
        }
        let Some(row) = self.rows.get(&key).cloned() else {
            return Ok(None);
        };
        for (name, value) in &row {
            object.set_field(name, value.clone())?;
        }

        let id = self.track(object, row)?;
        listener.notify(LifecycleEvent::AfterLoad, self, &EventArgs::Object(id))?;
        Ok(Some(id))
    }

    /// Schedules a tracked object for deletion.
    pub fn remove(&mut self, id: ObjectId) -> EngineResult<()> {
        if !self.objects.contains_key(&id) {
            return Err(EngineError::UnknownObject(id));
        }
        self.deletes.insert(id);
        Ok(())
    }

    /// Diffs every managed object against its snapshot and schedules the
    /// changed ones for update.
    pub fn compute_change_sets(&mut self) -> EngineResult<()> {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            if self.inserts.contains(&id) || self.deletes.contains(&id) {
                continue;
            }
            self.recompute_change_set(id)?;
            if self.change_set(id).is_some_and(|changes| !changes.is_empty()) {
                self.updates.insert(id);
            }
        }
        Ok(())
    }

    /// Writes pending inserts, updates and deletes, raising the flush and
    /// post-write events around them.
    pub fn flush<L>(&mut self, listener: &L) -> EngineResult<()>
    where
        L: LifecycleListener + ?Sized,
    {
        listener.notify(LifecycleEvent::PreFlush, self, &EventArgs::Flush)?;
        self.compute_change_sets()?;
        listener.notify(LifecycleEvent::OnFlush, self, &EventArgs::Flush)?;

        for id in std::mem::take(&mut self.inserts) {
            let values = self.current_values(id)?;
            let tracked = self.tracked_mut(id)?;
            tracked.row_key = Self::key_of(tracked.object.as_ref(), Some(id))?;
            tracked.original = values.clone();
            tracked.change_set.clear();
            let key = tracked.row_key.clone();
            self.rows.insert(key, values.clone());
            self.writes.push(WriteRecord {
                id,
                kind: WriteKind::Insert,
                values,
            });
            listener.notify(LifecycleEvent::AfterInsert, self, &EventArgs::Object(id))?;
        }

        let updates: Vec<ObjectId> = self.updates.iter().copied().collect();
        for id in updates {
            listener.notify(LifecycleEvent::BeforeUpdate, self, &EventArgs::Update(id))?;
            let tracked = self.tracked_mut(id)?;
            let changes = std::mem::take(&mut tracked.change_set);
            if !changes.is_empty() {
                let mut values = Snapshot::new();
                for (name, change) in changes {
                    tracked.original.insert(name.clone(), change.new.clone());
                    values.insert(name, change.new);
                }
                let key = tracked.row_key.clone();
                let row = self.rows.entry(key).or_default();
                for (name, value) in &values {
                    row.insert(name.clone(), value.clone());
                }
                self.writes.push(WriteRecord {
                    id,
                    kind: WriteKind::Update,
                    values,
                });
            }
            self.updates.remove(&id);
            listener.notify(LifecycleEvent::AfterUpdate, self, &EventArgs::Object(id))?;
        }

        for id in std::mem::take(&mut self.deletes) {
            if let Some(tracked) = self.objects.remove(&id) {
                self.rows.remove(&tracked.row_key);
                self.writes.push(WriteRecord {
                    id,
                    kind: WriteKind::Delete,
                    values: Snapshot::new(),
                });
            }
        }
        debug!(tracked = self.objects.len(), rows = self.rows.len(), "Flushed unit of work");
        Ok(())
    }

    /// Detaches every object and ends the unit of work.
    pub fn clear<L>(&mut self, listener: &L)
    where
        L: LifecycleListener + ?Sized,
    {
        listener.end_unit_of_work(self);
        self.objects.clear();
        self.inserts.clear();
        self.updates.clear();
        self.deletes.clear();
        self.decoded.clear();
    }

    fn track(&mut self, object: Box<dyn Persistable>, original: Snapshot) -> EngineResult<ObjectId> {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        let row_key = Self::key_of(object.as_ref(), Some(id))?;
        let fields = object
            .schema()
            .fields
            .iter()
            .map(|field| field.name.clone())
            .collect();
        self.objects.insert(
            id,
            Tracked {
                object,
                fields,
                row_key,
                original,
                change_set: ChangeSet::new(),
            },
        );
        Ok(id)
    }

    /// Row key from the identifier field, falling back to the handle for
    /// objects without an identifier value.
    fn key_of(object: &dyn Persistable, fallback: Option<ObjectId>) -> EngineResult<(String, String)> {
        let entity_type = object.entity_type().to_string();
        let id = match object.schema().identifier {
            Some(name) => identifier_text(&object.get_field(&name)?),
            None => None,
        };
        match (id, fallback) {
            (Some(id), _) => Ok((entity_type, id)),
            (None, Some(handle)) => Ok((entity_type, handle.to_string())),
            (None, None) => Err(EngineError::UnsupportedIdentifierMapping(entity_type)),
        }
    }

    fn tracked_mut(&mut self, id: ObjectId) -> EngineResult<&mut Tracked> {
        self.objects
            .get_mut(&id)
            .ok_or(EngineError::UnknownObject(id))
    }

    fn current_values(&self, id: ObjectId) -> EngineResult<Snapshot> {
        let tracked = self
            .objects
            .get(&id)
            .ok_or(EngineError::UnknownObject(id))?;
        tracked
            .fields
            .iter()
            .map(|name| Ok((name.clone(), tracked.object.get_field(name)?)))
            .collect()
    }
}

impl PersistenceContext for InMemoryUnitOfWork {
    fn object(&self, id: ObjectId) -> Option<&dyn Persistable> {
        self.objects.get(&id).map(|tracked| tracked.object.as_ref())
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut (dyn Persistable + 'static)> {
        self.objects.get_mut(&id).map(|tracked| tracked.object.as_mut())
    }

    fn identity_map(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn original_data(&self, id: ObjectId) -> Option<&Snapshot> {
        self.objects.get(&id).map(|tracked| &tracked.original)
    }

    fn set_original_value(&mut self, id: ObjectId, field: &str, value: Value) {
        if let Some(tracked) = self.objects.get_mut(&id) {
            tracked.original.insert(field.to_string(), value);
        }
    }

    fn change_set(&self, id: ObjectId) -> Option<&ChangeSet> {
        self.objects.get(&id).map(|tracked| &tracked.change_set)
    }

    fn recompute_change_set(&mut self, id: ObjectId) -> EngineResult<()> {
        let tracked = self.tracked_mut(id)?;
        let mut changes = ChangeSet::new();
        for name in &tracked.fields {
            let current = tracked.object.get_field(name)?;
            let old = tracked.original.get(name).cloned().unwrap_or(Value::Null);
            if current != old {
                changes.insert(name.clone(), FieldChange { old, new: current });
            }
        }
        tracked.change_set = changes;
        Ok(())
    }

    fn is_scheduled_for_update(&self, id: ObjectId) -> bool {
        self.updates.contains(&id)
    }

    fn is_scheduled_for_delete(&self, id: ObjectId) -> bool {
        self.deletes.contains(&id)
    }

    fn scheduled_updates(&self) -> Vec<ObjectId> {
        self.updates.iter().copied().collect()
    }

    fn decoded(&self) -> &DecodedRegistry {
        &self.decoded
    }
}
