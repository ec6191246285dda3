use std::fs;
use std::io::Write;
use std::path::Path;

use crate::store::{Document, Entries, StoreError};

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Reads a document; a missing file is an empty document.
pub(super) fn read_document(path: &Path, doc: Document) -> Result<Entries, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
        Err(e) => return Err(io_err(path, e)),
    };
    if raw.trim().is_empty() {
        return Ok(Entries::new());
    }
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt { doc, source })
}

/// Writes through a sibling temp file and renames it into place, so readers
/// never observe a half-written document.
pub(super) fn write_document(path: &Path, doc: Document, entries: &Entries) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let body = serde_json::to_vec_pretty(entries).map_err(|source| StoreError::Encode { doc, source })?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        f.write_all(&body).map_err(|e| io_err(&tmp, e))?;
        f.sync_all().map_err(|e| io_err(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))
}

pub(super) fn remove_document(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}
