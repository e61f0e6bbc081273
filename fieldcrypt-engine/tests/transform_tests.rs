mod common;

use common::{citizen, encryptor, engine, engine_with, is_ciphertext, ssn_handlers, user};
use fieldcrypt_crypto::Encryptor;
use fieldcrypt_engine::{EngineError, HandlerRegistry, ValueTransformer};
use fieldcrypt_model::{Encrypted, Entity, EntitySchema, HandlerRef, Operation, Persistable};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn transformer() -> ValueTransformer {
    ValueTransformer::new(encryptor(), Arc::new(HandlerRegistry::new()))
}

// ── Primitive path ──────────────────────────────────────────────

#[test]
fn string_roundtrip() {
    let t = transformer();
    let encrypted = t
        .transform_value(&json!("hello"), Operation::Encrypt, false)
        .unwrap();
    assert!(is_ciphertext(&encrypted));
    let decrypted = t
        .transform_value(&encrypted, Operation::Decrypt, false)
        .unwrap();
    assert_eq!(decrypted, json!("hello"));
}

#[test]
fn null_passes_through() {
    let t = transformer();
    assert_eq!(
        t.transform_value(&Value::Null, Operation::Encrypt, true).unwrap(),
        Value::Null
    );
    assert_eq!(
        t.transform_value(&Value::Null, Operation::Decrypt, true).unwrap(),
        Value::Null
    );
}

#[test]
fn arrays_and_maps_recurse() {
    let t = transformer();
    let value = json!({"a": "one", "b": ["two", null, {"c": "three"}]});
    let encrypted = t.transform_value(&value, Operation::Encrypt, true).unwrap();

    assert!(is_ciphertext(&encrypted["a"]));
    assert!(is_ciphertext(&encrypted["b"][0]));
    assert_eq!(encrypted["b"][1], Value::Null);
    assert!(is_ciphertext(&encrypted["b"][2]["c"]));

    let decrypted = t.transform_value(&encrypted, Operation::Decrypt, true).unwrap();
    assert_eq!(decrypted, value);
}

#[test]
fn scalars_keep_their_type() {
    let t = transformer();
    for value in [json!(42), json!(-1.5), json!(true), json!(false)] {
        let encrypted = t.transform_value(&value, Operation::Encrypt, true).unwrap();
        assert!(is_ciphertext(&encrypted));
        let decrypted = t.transform_value(&encrypted, Operation::Decrypt, true).unwrap();
        assert_eq!(decrypted, value);
    }

    // Numeric-looking strings stay strings.
    let encrypted = t.transform_value(&json!("42"), Operation::Encrypt, true).unwrap();
    assert_ne!(encrypted, t.transform_value(&json!(42), Operation::Encrypt, true).unwrap());
    assert_eq!(
        t.transform_value(&encrypted, Operation::Decrypt, true).unwrap(),
        json!("42")
    );

    // A number read back from storage is never ciphertext.
    assert_eq!(
        t.transform_value(&json!(true), Operation::Decrypt, false).unwrap(),
        json!(true)
    );
}

#[test]
fn decrypt_of_plaintext_is_identity() {
    let t = transformer();
    assert_eq!(
        t.transform_value(&json!("legacy"), Operation::Decrypt, false).unwrap(),
        json!("legacy")
    );
}

#[test]
fn malformed_ciphertext_is_cipher_failure() {
    let t = transformer();
    let err = t
        .transform_value(&json!("_ENC_not base64!"), Operation::Decrypt, false)
        .unwrap_err();
    assert!(matches!(err, EngineError::CipherFailure(_)));
}

// ── Directives ──────────────────────────────────────────────────

#[test]
fn decrypt_only_field_is_untouched_on_encrypt() {
    let t = transformer();
    let schema = Arc::new(
        EntitySchema::new("Legacy").encrypted("archived", Encrypted::random().decrypt_only()),
    );
    let entity = Entity::new(schema).with("archived", "old").unwrap();
    let directive = Encrypted::random().decrypt_only();

    let out = t
        .transform(&entity, "archived", &directive, Operation::Encrypt)
        .unwrap();
    assert_eq!(out, None);

    let out = t
        .transform(&entity, "archived", &directive, Operation::Decrypt)
        .unwrap();
    assert_eq!(out, Some(json!("old")));
}

#[test]
fn handler_owns_the_transform() {
    let calls = Arc::new(AtomicUsize::new(0));
    let t = ValueTransformer::new(encryptor(), Arc::new(ssn_handlers(calls.clone())));
    let directive = Encrypted::random().with_handler("ssn_handler", "transform");

    let encrypted = t
        .apply(&directive, json!("abc-123"), Operation::Encrypt)
        .unwrap();
    assert!(is_ciphertext(&encrypted));
    // The handler upper-cased before encrypting.
    let raw = encryptor()
        .decrypt_str(encrypted.as_str().unwrap(), false)
        .unwrap();
    assert_eq!(raw, "ABC-123");

    let decrypted = t.apply(&directive, encrypted, Operation::Decrypt).unwrap();
    assert_eq!(decrypted, json!("abc-123"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn unknown_handler_is_not_callable() {
    let t = transformer();
    let directive = Encrypted::random().with_handler("ssn_handler", "missing");
    let err = t.apply(&directive, json!("x"), Operation::Encrypt).unwrap_err();
    match err {
        EngineError::HandlerNotCallable(handler) => {
            assert_eq!(handler, HandlerRef::new("ssn_handler", "missing"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn handler_failure_is_reported() {
    let handlers = HandlerRegistry::new().with(
        "strict",
        "reject",
        |_: &dyn Encryptor, _: Value, _: Operation| -> Result<Value, String> {
            Err("rejected".into())
        },
    );
    let t = ValueTransformer::new(encryptor(), Arc::new(handlers));
    let directive = Encrypted::random().with_handler("strict", "reject");
    let err = t.apply(&directive, json!("x"), Operation::Encrypt).unwrap_err();
    assert!(matches!(err, EngineError::Handler { ref reason, .. } if reason == "rejected"));
}

// ── Engine per-object operations ────────────────────────────────

#[test]
fn process_fields_encrypts_only_directive_fields() {
    let engine = engine();
    let mut object = user(1, "Ada", "ada@example.com", "NO93");
    assert!(engine.process_fields(object.as_mut(), Operation::Encrypt).unwrap());

    assert_eq!(object.get_field("name").unwrap(), json!("Ada"));
    assert_eq!(object.get_field("id").unwrap(), json!(1));
    assert!(is_ciphertext(&object.get_field("email").unwrap()));
    assert!(is_ciphertext(&object.get_field("iban").unwrap()));

    engine.process_fields(object.as_mut(), Operation::Decrypt).unwrap();
    assert_eq!(object.get_field("email").unwrap(), json!("ada@example.com"));
    assert_eq!(object.get_field("iban").unwrap(), json!("NO93"));
}

#[test]
fn process_fields_without_directives_is_noop() {
    let engine = engine();
    let schema = Arc::new(EntitySchema::new("Tag").with_identifier("id").plain("label"));
    let mut object = Entity::new(schema).with("label", "red").unwrap();
    assert!(!engine.process_fields(&mut object, Operation::Encrypt).unwrap());
    assert_eq!(object.get_field("label").unwrap(), json!("red"));
}

#[test]
fn failing_field_leaves_object_untouched() {
    let engine = engine_with(HandlerRegistry::new());
    let mut object = citizen(1, "Ada", "abc");
    let err = engine
        .process_fields(object.as_mut(), Operation::Encrypt)
        .unwrap_err();
    assert!(matches!(err, EngineError::HandlerNotCallable(_)));
    assert_eq!(object.get_field("ssn").unwrap(), json!("abc"));
}

#[test]
fn field_value_does_not_write_back() {
    let engine = engine();
    let mut object = user(1, "Ada", "ada@example.com", "NO93");
    engine.process_fields(object.as_mut(), Operation::Encrypt).unwrap();
    let stored = object.get_field("email").unwrap();

    let plain = engine
        .field_value(object.as_ref(), "email", Operation::Decrypt)
        .unwrap();
    assert_eq!(plain, Some(json!("ada@example.com")));
    assert_eq!(object.get_field("email").unwrap(), stored);

    assert_eq!(
        engine.field_value(object.as_ref(), "name", Operation::Decrypt).unwrap(),
        None
    );
}

#[test]
fn unchanged_value_is_raw_for_encrypted_fields_only() {
    let engine = engine();
    let object = user(1, "Ada", "ada@example.com", "NO93");
    assert_eq!(
        engine.unchanged_value(object.as_ref(), "email").unwrap(),
        Some(json!("ada@example.com"))
    );
    assert_eq!(engine.unchanged_value(object.as_ref(), "name").unwrap(), None);
}

#[test]
fn object_determinism_follows_first_encrypting_field() {
    let engine = engine();
    // email (random) is declared before iban (deterministic).
    assert!(!engine.is_deterministic(user(1, "a", "b", "c").as_ref()));

    let schema = Arc::new(
        EntitySchema::new("Card")
            .encrypted("legacy", Encrypted::random().decrypt_only())
            .encrypted("pan", Encrypted::deterministic()),
    );
    assert!(engine.is_deterministic(&Entity::new(schema)));
}

#[test]
fn has_encrypted_fields_reports_directives() {
    let engine = engine();
    assert!(engine.has_encrypted_fields(user(1, "a", "b", "c").as_ref()));
    let schema = Arc::new(EntitySchema::new("Tag").plain("label"));
    assert!(!engine.has_encrypted_fields(&Entity::new(schema)));
}
