//! Lock store trait
//!
//! Defines the interface for the durable singleton lock record.

use async_trait::async_trait;

use crate::model::LockRecord;

/// Durable storage for the singleton lock record
///
/// Offers only independent read and unconditional write; callers that need
/// the read-then-write sequence to be atomic must serialize it themselves.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Read the current record, `None` if nothing has been stored yet
    async fn get(&self) -> anyhow::Result<Option<LockRecord>>;

    /// Unconditionally overwrite the record
    async fn set(&self, record: &LockRecord) -> anyhow::Result<()>;
}
