use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::store::types::{Document, Entries, UPDATED_AT};

/// Keyed JSON documents holding breaker and retry state.
///
/// Every save is a read-merge-write of the whole document. Implementations
/// serialize writers within one process; concurrent processes sharing a
/// store are last-writer-wins.
pub trait StateStore: Send + Sync {
    /// All entries of `doc`; a missing document is empty.
    fn load(&self, doc: Document) -> Result<Entries, StoreError>;

    /// Replaces the entry for `key`, leaving every other entry untouched.
    fn save_entry(&self, doc: Document, key: &str, value: JsonValue) -> Result<(), StoreError>;

    /// Deletes the whole document.
    fn clear(&self, doc: Document) -> Result<(), StoreError>;

    fn load_entry(&self, doc: Document, key: &str) -> Result<Option<JsonValue>, StoreError> {
        Ok(self.load(doc)?.remove(key))
    }
}

/// Adds the `updated_at` stamp to an entry about to be written.
pub fn stamp(mut value: JsonValue, at: DateTime<Utc>) -> JsonValue {
    if let JsonValue::Object(map) = &mut value {
        map.insert(UPDATED_AT.to_string(), JsonValue::String(at.to_rfc3339()));
    }
    value
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("document {doc} is corrupt: {source}")]
    Corrupt {
        doc: Document,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document {doc}: {source}")]
    Encode {
        doc: Document,
        #[source]
        source: serde_json::Error,
    },
}
