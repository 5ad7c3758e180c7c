//! In-memory store implementations
//!
//! Used by tests and by the server when no data directory is configured.
//! State does not survive a restart; the file backend is the one to deploy.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::model::LockRecord;
use crate::traits::{BlobStore, LockStore};

/// Lock store holding the record in process memory
#[derive(Default)]
pub struct MemoryLockStore {
    record: RwLock<Option<LockRecord>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self) -> anyhow::Result<Option<LockRecord>> {
        Ok(self.record.read().await.clone())
    }

    async fn set(&self, record: &LockRecord) -> anyhow::Result<()> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }
}

/// Blob store holding payloads in process memory
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a blob, for test setup
    pub async fn insert(&self, name: &str, content: Bytes) {
        self.blobs.write().await.insert(name.to_string(), content);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, name: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn put(&self, name: &str, content: Bytes) -> anyhow::Result<()> {
        self.blobs.write().await.insert(name.to_string(), content);
        Ok(())
    }
}
