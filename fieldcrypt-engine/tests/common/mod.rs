//! Shared fixtures for engine tests.

#![allow(dead_code)]

use fieldcrypt_crypto::{Encryptor, PrefixedAesEncryptor};
use fieldcrypt_engine::{Engine, HandlerRegistry, InMemoryUnitOfWork, ObjectId, PersistenceContext};
use fieldcrypt_model::{Encrypted, Entity, EntitySchema, Operation, Persistable};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const PREFIX: &str = "_ENC_";

pub fn encryptor() -> Arc<dyn Encryptor> {
    Arc::new(PrefixedAesEncryptor::new("k", "s", PREFIX))
}

/// `User`: plain name, random-IV email, deterministic iban.
pub fn user_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::new("User")
            .with_identifier("id")
            .plain("name")
            .encrypted("email", Encrypted::random())
            .encrypted("iban", Encrypted::deterministic()),
    )
}

/// `Citizen`: ssn goes through the `ssn_handler::transform` handler.
pub fn citizen_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::new("Citizen")
            .with_identifier("id")
            .plain("name")
            .encrypted("ssn", Encrypted::random().with_handler("ssn_handler", "transform")),
    )
}

/// `Legacy`: a decrypt-only field next to a regular one.
pub fn legacy_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::new("Legacy")
            .with_identifier("id")
            .encrypted("archived", Encrypted::random().decrypt_only())
            .encrypted("note", Encrypted::random()),
    )
}

pub fn user(id: u64, name: &str, email: &str, iban: &str) -> Box<dyn Persistable> {
    Box::new(
        Entity::new(user_schema())
            .with("id", id)
            .and_then(|e| e.with("name", name))
            .and_then(|e| e.with("email", email))
            .and_then(|e| e.with("iban", iban))
            .unwrap(),
    )
}

/// A `User` holding only its identifier, ready to be hydrated by `load`.
pub fn user_ref(id: u64) -> Box<dyn Persistable> {
    Box::new(Entity::new(user_schema()).with("id", id).unwrap())
}

pub fn citizen(id: u64, name: &str, ssn: &str) -> Box<dyn Persistable> {
    Box::new(
        Entity::new(citizen_schema())
            .with("id", id)
            .and_then(|e| e.with("name", name))
            .and_then(|e| e.with("ssn", ssn))
            .unwrap(),
    )
}

/// Upper-cases on encrypt and lower-cases on decrypt, counting calls.
pub fn ssn_handlers(calls: Arc<AtomicUsize>) -> HandlerRegistry {
    HandlerRegistry::new().with(
        "ssn_handler",
        "transform",
        move |encryptor: &dyn Encryptor, value: Value, operation: Operation| -> Result<Value, String> {
            calls.fetch_add(1, Ordering::SeqCst);
            let text = value.as_str().ok_or("ssn must be a string")?;
            let out = match operation {
                Operation::Encrypt => encryptor
                    .encrypt_str(&text.to_uppercase(), false)
                    .map_err(|e| e.to_string())?,
                Operation::Decrypt => encryptor
                    .decrypt_str(text, false)
                    .map_err(|e| e.to_string())?
                    .to_lowercase(),
            };
            Ok(Value::String(out))
        },
    )
}

pub fn engine() -> Arc<Engine> {
    Arc::new(Engine::new(encryptor(), ssn_handlers(Arc::default())))
}

pub fn engine_with(handlers: HandlerRegistry) -> Arc<Engine> {
    Arc::new(Engine::new(encryptor(), handlers))
}

pub fn field(ctx: &dyn PersistenceContext, id: ObjectId, name: &str) -> Value {
    ctx.object(id).unwrap().get_field(name).unwrap()
}

pub fn text(ctx: &dyn PersistenceContext, id: ObjectId, name: &str) -> String {
    field(ctx, id, name).as_str().unwrap().to_string()
}

pub fn original(ctx: &dyn PersistenceContext, id: ObjectId, name: &str) -> Value {
    ctx.original_data(id)
        .and_then(|snapshot| snapshot.get(name).cloned())
        .unwrap_or(Value::Null)
}

pub fn is_ciphertext(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.starts_with(PREFIX))
}

/// Stores a `User` row whose encrypted columns hold ciphertext.
pub fn seed_user(uow: &mut InMemoryUnitOfWork, id: u64, name: &str, email: &str, iban: &str) {
    let enc = encryptor();
    let row = json!({
        "id": id,
        "name": name,
        "email": enc.encrypt_str(email, false).unwrap(),
        "iban": enc.encrypt_str(iban, true).unwrap(),
    });
    let Value::Object(row) = row else { unreachable!() };
    uow.seed_row("User", &id.to_string(), row);
}
