use parking_lot::Mutex;
use std::collections::HashSet;

/// Objects whose in-memory fields currently hold plaintext.
///
/// Keyed by entity type and identifier text. Each persistence context owns
/// one; it guards the decrypt path so an object is decrypted at most once per
/// unit of work. The encrypt path
/// removes an object again, because its in-memory values are ciphertext
/// until the next decrypt.
#[derive(Debug, Default)]
pub struct DecodedRegistry {
    entries: Mutex<HashSet<(String, String)>>,
}

impl DecodedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity_type: &str, id: &str) -> bool {
        self.entries
            .lock()
            .contains(&(entity_type.to_string(), id.to_string()))
    }

    /// Returns `false` if the object was already recorded.
    pub fn insert(&self, entity_type: &str, id: &str) -> bool {
        self.entries
            .lock()
            .insert((entity_type.to_string(), id.to_string()))
    }

    /// Returns `true` if the object was recorded.
    pub fn remove(&self, entity_type: &str, id: &str) -> bool {
        self.entries
            .lock()
            .remove(&(entity_type.to_string(), id.to_string()))
    }

    /// Forgets everything; called when a unit of work ends.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
