//! Durable key/value storage effects.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `vesper-effects` (filesystem, memory)
//! - **Usage**: persisted counters, timestamps and deadlines
//!
//! Values are opaque bytes. The store must survive process restarts; there is
//! exactly one writer process.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StorageError {
    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },
    #[error("Read failed: {0}")]
    ReadFailed(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
}

/// Persistent key/value store.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve the value for a key, `None` if absent.
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove a key, returning whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Store several values. Stops at the first failure.
    async fn store_batch(&self, pairs: HashMap<String, Vec<u8>>) -> Result<(), StorageError> {
        for (key, value) in pairs {
            self.store(&key, value).await?;
        }
        Ok(())
    }
}

/// Blanket implementation for Arc<T> where T: StorageEffects
#[async_trait]
impl<T: StorageEffects + ?Sized> StorageEffects for std::sync::Arc<T> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }

    async fn store_batch(&self, pairs: HashMap<String, Vec<u8>>) -> Result<(), StorageError> {
        (**self).store_batch(pairs).await
    }
}
