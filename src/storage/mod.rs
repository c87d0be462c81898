mod feed;
pub(crate) mod files;
pub mod backends;
pub mod store;

pub use backends::{JsonFileStore, MemoryStore};
pub use store::{LibraryStore, Snapshot, StoreError};
