//! In-memory storage handler

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use vesper_core::effects::{StorageEffects, StorageError};

/// In-memory storage handler. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageHandler {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorageHandler {
    /// Create a new memory storage handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait]
impl StorageEffects for MemoryStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        Ok(data.remove(key).is_some())
    }

    async fn store_batch(&self, pairs: HashMap<String, Vec<u8>>) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.extend(pairs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let handler = MemoryStorageHandler::new();
        let other = handler.clone();

        let mut batch = HashMap::new();
        batch.insert("a".to_string(), b"1".to_vec());
        batch.insert("b".to_string(), b"2".to_vec());
        handler.store_batch(batch).await.unwrap();

        assert_eq!(other.retrieve("b").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(other.len().await, 2);
        assert!(other.remove("a").await.unwrap());
        assert_eq!(handler.retrieve("a").await.unwrap(), None);
    }
}
