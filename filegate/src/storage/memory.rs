//! In-process object store, used with `storage.backend: memory` and throughout the tests.

use super::{ObjectStore, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<DashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self) -> Result<Vec<String>> {
        // DashMap iteration order is arbitrary; sort to match S3's lexicographic listing
        let mut keys: Vec<String> = self.objects.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<()> {
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes> {
        self.objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound { key: key.to_string() })
    }
}
