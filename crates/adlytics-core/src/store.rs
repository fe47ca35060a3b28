//! Injected key-value storage seam for identities and upstream tokens.

use async_trait::async_trait;

/// String-keyed store with atomic per-key upsert.
///
/// Concurrent callbacks for the same key may race; each write is
/// self-consistent, so last write wins is acceptable. The in-memory
/// implementation lives in the server crate; a persistent backend can be
/// swapped in behind the same trait.
#[async_trait]
pub trait KeyValueStore<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<T>;

    async fn upsert(&self, key: &str, value: T);
}
