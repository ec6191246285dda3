#![forbid(unsafe_code)]

pub mod file;
pub mod memory;
pub mod store;

pub use crate::file::JsonFileStore;
pub use crate::memory::MemoryStore;
pub use crate::store::{Document, Entries, StateStore, StoreError, UPDATED_AT, stamp};
