use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

use crate::store::{Document, Entries, StateStore, StoreError};

use super::io;

/// One pretty-printed JSON file per [`Document`] inside `dir`.
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, doc: Document) -> PathBuf {
        self.dir.join(doc.file_name())
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, doc: Document) -> Result<Entries, StoreError> {
        io::read_document(&self.path_of(doc), doc)
    }

    fn save_entry(&self, doc: Document, key: &str, value: JsonValue) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_of(doc);
        let mut entries = match io::read_document(&path, doc) {
            Ok(entries) => entries,
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!(error = %e, path = %path.display(), "discarding corrupt state document");
                Entries::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value);
        io::write_document(&path, doc, &entries)
    }

    fn clear(&self, doc: Document) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        io::remove_document(&self.path_of(doc))
    }
}
