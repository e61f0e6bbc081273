//! Field directive model for fieldcrypt.
//!
//! Defines what the engine needs to know about persisted objects:
//! - [`Encrypted`]: the per-field directive (deterministic, decrypt-only, custom handler)
//! - [`EntitySchema`]: a type's declared fields, identifier and directives
//! - [`Persistable`]: name-based field access, the engine's stand-in for reflection
//! - [`Entity`]: a schema-driven object backed by a JSON map
//! - [`DirectiveResolver`]: per-type directive lookup with a shared cache

mod directive;
mod entity;
mod error;
mod resolver;
mod schema;

pub use directive::{Encrypted, HandlerRef, Operation};
pub use entity::{identifier_text, Entity, Persistable};
pub use error::{ModelError, ModelResult};
pub use resolver::{DirectiveResolver, ResolvedField, TypeDirectives};
pub use schema::{EntitySchema, FieldSpec};
