use crate::context::{tracked, tracked_mut, ObjectId, PersistenceContext};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use fieldcrypt_model::{Operation, Persistable};

/// One tracked object bound to its persistence context and a transform
/// direction.
///
/// Document-paradigm hooks go through this so field writes and snapshot
/// access share one borrow of the context.
pub struct ObjectWrapper<'a> {
    context: &'a mut dyn PersistenceContext,
    id: ObjectId,
    operation: Operation,
}

impl<'a> ObjectWrapper<'a> {
    /// Fails if the context does not track `id`.
    pub fn new(
        context: &'a mut dyn PersistenceContext,
        id: ObjectId,
        operation: Operation,
    ) -> EngineResult<Self> {
        if context.object(id).is_none() {
            return Err(EngineError::UnknownObject(id));
        }
        Ok(Self {
            context,
            id,
            operation,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Encrypts or decrypts the object according to the wrapper's operation.
    ///
    /// Returns whether the object's type has encrypted fields, or on the
    /// decrypt side, whether fields were decrypted.
    pub fn process(&mut self, engine: &Engine) -> EngineResult<bool> {
        match self.operation {
            Operation::Encrypt => engine.encrypt_object(&mut *self.context, self.id),
            Operation::Decrypt => engine.decrypt_object(&mut *self.context, self.id),
        }
    }

    pub fn object(&self) -> EngineResult<&dyn Persistable> {
        tracked(&*self.context, self.id)
    }

    pub fn object_mut(&mut self) -> EngineResult<&mut (dyn Persistable + 'static)> {
        tracked_mut(&mut *self.context, self.id)
    }

    pub fn context(&self) -> &dyn PersistenceContext {
        &*self.context
    }

    pub fn context_mut(&mut self) -> &mut dyn PersistenceContext {
        &mut *self.context
    }
}
