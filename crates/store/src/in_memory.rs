//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use threadloop_core::error::StoreError;
use threadloop_core::{DemoId, Thread, ThreadStore};
use tokio::sync::RwLock;

/// A store that keeps threads in a map for the life of the process.
pub struct InMemoryThreadStore {
    threads: Arc<RwLock<HashMap<DemoId, Thread>>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    fn name(&self) -> &str { "in_memory" }

    async fn load(&self, key: DemoId) -> Result<Thread, StoreError> {
        Ok(self.threads.read().await.get(&key).cloned().unwrap_or_default())
    }

    async fn save(&self, key: DemoId, thread: &Thread) -> Result<(), StoreError> {
        self.threads.write().await.insert(key, thread.clone());
        Ok(())
    }

    async fn clear(&self, key: DemoId) -> Result<(), StoreError> {
        self.threads.write().await.remove(&key);
        Ok(())
    }
}
