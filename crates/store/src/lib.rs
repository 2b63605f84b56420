//! Conversation store implementations for threadloop.

pub mod file_backend;
pub mod in_memory;

use std::sync::Arc;

use threadloop_core::ThreadStore;

pub use file_backend::FileThreadStore;
pub use in_memory::InMemoryThreadStore;

/// Build the store selected by `[store]` in the configuration.
pub fn build_from_config(config: &threadloop_config::AppConfig) -> Arc<dyn ThreadStore> {
    match config.store.backend.as_str() {
        "memory" => Arc::new(InMemoryThreadStore::new()),
        _ => Arc::new(FileThreadStore::new(config.store.resolved_path())),
    }
}
