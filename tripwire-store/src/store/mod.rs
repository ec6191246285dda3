mod trait_store;
mod types;

pub use trait_store::{StateStore, StoreError, stamp};
pub use types::{Document, Entries, UPDATED_AT};
