//! Blob store trait
//!
//! Defines the interface for named, immutable-once-written save payloads.

use async_trait::async_trait;
use bytes::Bytes;

/// Content storage addressed by name
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob by name, `None` if no blob with that name exists
    async fn get(&self, name: &str) -> anyhow::Result<Option<Bytes>>;

    /// Store a blob under the given name
    async fn put(&self, name: &str, content: Bytes) -> anyhow::Result<()>;
}
