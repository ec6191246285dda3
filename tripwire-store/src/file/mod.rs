mod io;
mod store;

pub use store::JsonFileStore;
