//! Change-tracking reconciliation.
//!
//! Random-IV ciphertexts differ on every encryption, and decrypted objects
//! hold plaintext while their snapshot holds ciphertext. Either way the
//! dirty-checker would see a change that is not one. Reconciliation rewrites
//! the snapshot entry to the current raw value whenever both sides decrypt
//! to the same plaintext.

use crate::context::{tracked, ObjectId, PersistenceContext};
use crate::engine::Engine;
use crate::error::EngineResult;
use fieldcrypt_model::Operation;
use serde_json::Value;
use tracing::debug;

/// Reconciles every object in the identity map.
///
/// Returns the number of snapshot entries rewritten. Running it again
/// without intervening changes rewrites nothing.
pub fn reconcile(engine: &Engine, ctx: &mut dyn PersistenceContext) -> EngineResult<usize> {
    let mut rewritten = 0;
    for id in ctx.identity_map() {
        rewritten += reconcile_object(engine, ctx, id)?;
    }
    if rewritten > 0 {
        debug!(rewritten, "Reconciled snapshot entries");
    }
    Ok(rewritten)
}

/// Reconciles one object.
///
/// The current value goes through the field's directive (custom handler
/// included). The snapshot value is decrypted with the primitive path and
/// the object-wide deterministic flag.
pub fn reconcile_object(
    engine: &Engine,
    ctx: &mut dyn PersistenceContext,
    id: ObjectId,
) -> EngineResult<usize> {
    let object = tracked(&*ctx, id)?;
    let directives = engine.resolver().resolve(object);
    if directives.is_empty() {
        return Ok(0);
    }
    let Some(original) = ctx.original_data(id) else {
        return Ok(0);
    };
    let deterministic = directives.first_deterministic();
    let transformer = engine.transformer();

    let mut rewrites: Vec<(String, Value)> = Vec::new();
    for field in directives.fields() {
        let Some(original_value) = original.get(&field.name) else {
            continue;
        };
        let current = object.get_field(&field.name)?;
        if original_value == &current {
            continue;
        }
        let current_plain = transformer.apply(&field.directive, current.clone(), Operation::Decrypt)?;
        let original_plain =
            transformer.transform_value(original_value, Operation::Decrypt, deterministic)?;
        if current_plain == original_plain {
            rewrites.push((field.name.clone(), current));
        }
    }

    let count = rewrites.len();
    for (name, value) in rewrites {
        ctx.set_original_value(id, &name, value);
    }
    Ok(count)
}

/// Pins the snapshot of every encrypted field to its current raw value.
///
/// Used on update when the change set touches no encrypted field, so the
/// fresh ciphertext of an unchanged plaintext is not written.
pub fn pin_encrypted_originals(
    engine: &Engine,
    ctx: &mut dyn PersistenceContext,
    id: ObjectId,
) -> EngineResult<()> {
    let object = tracked(&*ctx, id)?;
    let directives = engine.resolver().resolve(object);
    let values = directives
        .fields()
        .iter()
        .map(|field| Ok((field.name.clone(), object.get_field(&field.name)?)))
        .collect::<EngineResult<Vec<_>>>()?;
    for (name, value) in values {
        ctx.set_original_value(id, &name, value);
    }
    Ok(())
}
