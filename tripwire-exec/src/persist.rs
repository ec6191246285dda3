//! Best-effort persistence shared by breakers and retry policies.
//!
//! Durable state is an optimization: every failure here is logged and
//! swallowed, and the in-memory state stays authoritative.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tripwire_store::{Document, StateStore, stamp};

pub(crate) fn load<T: DeserializeOwned>(store: &dyn StateStore, doc: Document, key: &str) -> Option<T> {
    let value = match store.load_entry(doc, key) {
        Ok(Some(v)) => v,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(document = %doc, key, error = %e, "failed to load persisted state, using defaults");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(document = %doc, key, error = %e, "ignoring unreadable persisted entry");
            None
        }
    }
}

pub(crate) fn save<T: Serialize>(store: &dyn StateStore, doc: Document, key: &str, value: &T, now: DateTime<Utc>) {
    let value = match serde_json::to_value(value) {
        Ok(v) => stamp(v, now),
        Err(e) => {
            tracing::warn!(document = %doc, key, error = %e, "failed to encode state");
            return;
        }
    };
    if let Err(e) = store.save_entry(doc, key, value) {
        tracing::warn!(document = %doc, key, error = %e, "failed to persist state");
    }
}

pub(crate) fn clear(store: &dyn StateStore, doc: Document) {
    if let Err(e) = store.clear(doc) {
        tracing::warn!(document = %doc, error = %e, "failed to clear persisted state");
    }
}
