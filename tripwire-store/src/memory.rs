use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use crate::store::{Document, Entries, StateStore, StoreError};

/// Process-local store for tests and runs that should leave nothing behind.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<Document, Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, doc: Document) -> Result<Entries, StoreError> {
        Ok(self.docs.lock().get(&doc).cloned().unwrap_or_default())
    }

    fn save_entry(&self, doc: Document, key: &str, value: JsonValue) -> Result<(), StoreError> {
        self.docs
            .lock()
            .entry(doc)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, doc: Document) -> Result<(), StoreError> {
        self.docs.lock().remove(&doc);
        Ok(())
    }
}
