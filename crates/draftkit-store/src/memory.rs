//! In-process store.

use std::collections::HashMap;
use std::sync::Arc;

use draftkit_protocol::SessionKey;
use tokio::sync::RwLock;

use crate::{SessionMeta, SessionStore, StoreError, StoredSession};

/// Keeps sessions in a map. Cloning shares the map.
///
/// Everything is lost on restart; use [`FileStore`](crate::FileStore)
/// when sessions must survive one.
#[derive(Debug)]
pub struct MemoryStore<S> {
    records: Arc<RwLock<HashMap<SessionKey, StoredSession<S>>>>,
}

impl<S> MemoryStore<S> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl<S> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for MemoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<S> SessionStore<S> for MemoryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn load(&self, key: &SessionKey) -> Result<Option<StoredSession<S>>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn save(&self, record: &StoredSession<S>) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<SessionMeta>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(StoredSession::meta)
            .collect())
    }
}
