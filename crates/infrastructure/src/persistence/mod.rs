//! Key-value store adapters.

mod file_store;
mod memory_store;

pub use file_store::{JsonFileStore, StoreWatcher, WATCH_DEBOUNCE, WORKSPACE_FILE, default_data_dir};
pub use memory_store::{CHANGE_BUFFER, InMemoryStore};
