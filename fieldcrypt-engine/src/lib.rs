//! Lifecycle interception and reconciliation for transparent field encryption.
//!
//! Hosts raise [`LifecycleEvent`]s against a [`PersistenceContext`]; an
//! [`Interceptor`] encrypts directive-carrying fields before writes, decrypts
//! them after reads, and keeps the host's dirty-checker from seeing freshly
//! produced ciphertext as a modification.
//!
//! - [`Engine`]: encryptor, handlers and directive cache
//! - [`Relational`] / [`Document`]: paradigm-specific hook behavior
//! - [`reconcile`]: snapshot rewriting for unchanged plaintext
//! - [`FieldCryptConfig`]: TOML configuration and bootstrap
//! - [`InMemoryUnitOfWork`]: a map-backed host for tests and embedding

mod config;
mod context;
mod engine;
mod error;
mod handler;
mod interceptor;
mod memory;
pub mod paradigm;
mod reconcile;
mod registry;
mod transform;
mod wrapper;

pub use config::{Bootstrap, Driver, FieldCryptConfig};
pub use context::{
    ChangeSet, EventArgs, FieldChange, LifecycleEvent, ObjectId, PersistenceContext, Snapshot,
};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use handler::{FieldHandler, HandlerRegistry};
pub use interceptor::{Interceptor, LifecycleListener, Subscribers};
pub use memory::{InMemoryUnitOfWork, WriteKind, WriteRecord};
pub use paradigm::{Direction, Document, Paradigm, Relational};
pub use reconcile::{pin_encrypted_originals, reconcile, reconcile_object};
pub use registry::DecodedRegistry;
pub use transform::ValueTransformer;
pub use wrapper::ObjectWrapper;
