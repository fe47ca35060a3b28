use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use adlytics_core::store::KeyValueStore;

/// Process-lifetime in-memory store. Per-key upsert is atomic under the
/// write lock, giving last-write-wins semantics for racing callbacks.
pub struct MemoryStore<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> KeyValueStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<T> {
        self.entries.read().await.get(key).cloned()
    }

    async fn upsert(&self, key: &str, value: T) {
        self.entries.write().await.insert(key.to_string(), value);
    }
}
