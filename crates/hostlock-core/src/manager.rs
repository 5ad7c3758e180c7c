//! Lock manager
//!
//! Implements the free/locked state machine on top of the lock store and the
//! blob store. The stores offer only independent read and unconditional
//! write, so every read-modify-write sequence here runs inside one async
//! mutex; concurrent acquires racing on a free lock see exactly one winner.
//!
//! Transition ordering is fetch-first, flip-second: the state only moves to
//! locked after the save bytes are in hand, and only moves back to free
//! after the uploaded bytes are durably stored. A storage failure therefore
//! never strands the record in a state the caller did not earn.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use hostlock_common::HostlockError;
use hostlock_persistence::{BlobStore, LockRecord, LockStore};

/// A save payload together with its blob name
#[derive(Clone, Debug)]
pub struct SaveFile {
    pub name: String,
    pub content: Bytes,
}

/// Result of an acquire attempt
#[derive(Debug)]
pub enum AcquireOutcome {
    /// The caller now holds the lock and receives the current save
    Acquired(SaveFile),
    /// The previous holder's lease expired and the caller took the lock over
    ForceAcquired {
        file: SaveFile,
        previous_holder: String,
    },
    /// Someone else holds the lock; no mutation, no blob access
    AlreadyLocked { holder: String },
}

/// Result of a release attempt
#[derive(Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// New save stored, lock freed
    Released,
    /// The lock was not held; a stale or duplicate upload was refused
    NotLocked,
}

/// Coordinates exclusive access to the shared save
pub struct LockManager {
    lock_store: Arc<dyn LockStore>,
    blob_store: Arc<dyn BlobStore>,
    /// Lease threshold in seconds; `None` means locks never expire
    lease_timeout_secs: Option<u64>,
    /// Serializes all read-modify-write sequences on the lock record
    mutex: Mutex<()>,
}

fn storage_err(e: anyhow::Error) -> HostlockError {
    HostlockError::StorageUnavailable(e.to_string())
}

impl LockManager {
    pub fn new(lock_store: Arc<dyn LockStore>, blob_store: Arc<dyn BlobStore>) -> Self {
        LockManager {
            lock_store,
            blob_store,
            lease_timeout_secs: None,
            mutex: Mutex::new(()),
        }
    }

    /// Enable lease expiry. A lock held longer than `secs` becomes eligible
    /// for forced takeover by the next acquire. Zero means every held lock
    /// is immediately reclaimable, which is useful only in tests.
    pub fn with_lease_timeout(mut self, secs: u64) -> Self {
        self.lease_timeout_secs = Some(secs);
        self
    }

    fn lease_expired(&self, record: &LockRecord) -> bool {
        match (self.lease_timeout_secs, record.acquired_at) {
            (Some(secs), Some(at)) => {
                (Utc::now() - at).num_milliseconds() >= secs as i64 * 1000
            }
            _ => false,
        }
    }

    /// Attempt to acquire the lock for `holder`.
    ///
    /// On success the current save is returned and the state flips to
    /// locked. If the blob fetch fails the state remains free.
    pub async fn acquire(&self, holder: &str) -> Result<AcquireOutcome, HostlockError> {
        let _guard = self.mutex.lock().await;

        let mut record = self
            .lock_store
            .get()
            .await
            .map_err(storage_err)?
            .unwrap_or_else(LockRecord::initial);

        let mut previous_holder = None;
        if !record.is_free() {
            let current = record.holder.clone().unwrap_or_else(|| "unknown".to_string());
            if self.lease_expired(&record) {
                warn!(
                    previous_holder = %current,
                    holder = %holder,
                    "Lease expired, forcing lock takeover"
                );
                previous_holder = Some(current);
            } else {
                debug!(holder = %current, "Acquire refused, lock already held");
                return Ok(AcquireOutcome::AlreadyLocked { holder: current });
            }
        }

        if record.is_uninitialized() {
            return Err(HostlockError::SaveNotInitialized);
        }

        let name = record.saved_filename.clone();
        let content = self
            .blob_store
            .get(&name)
            .await
            .map_err(storage_err)?
            .ok_or_else(|| {
                // The record points at a blob that does not exist; integrity
                // violation, not a routine miss.
                error!(file = %name, "Lock record references a missing blob");
                HostlockError::BlobNotFound(name.clone())
            })?;

        // Bytes in hand; now the state may flip.
        record.lock(holder, Utc::now());
        self.lock_store.set(&record).await.map_err(storage_err)?;

        info!(holder = %holder, file = %name, "Lock acquired");
        let file = SaveFile { name, content };
        Ok(match previous_holder {
            Some(previous_holder) => AcquireOutcome::ForceAcquired {
                file,
                previous_holder,
            },
            None => AcquireOutcome::Acquired(file),
        })
    }

    /// Store a new save under `filename` and release the lock.
    ///
    /// Refused with `NotLocked` when the lock is free. The one exception is
    /// a store with no record at all: the very first save enters the system
    /// through an upload, before any download could have taken the lock.
    /// If the blob write fails the lock stays held so the rightful holder
    /// can retry.
    pub async fn release(
        &self,
        filename: &str,
        content: Bytes,
    ) -> Result<ReleaseOutcome, HostlockError> {
        let _guard = self.mutex.lock().await;

        let mut record = match self.lock_store.get().await.map_err(storage_err)? {
            Some(record) if record.is_free() => {
                debug!(file = %filename, "Release refused, lock not held");
                return Ok(ReleaseOutcome::NotLocked);
            }
            Some(record) => record,
            None => {
                info!(file = %filename, "No lock record yet, accepting bootstrap upload");
                LockRecord::initial()
            }
        };

        self.blob_store
            .put(filename, content)
            .await
            .map_err(storage_err)?;

        record.unlock(filename);
        self.lock_store.set(&record).await.map_err(storage_err)?;

        info!(file = %filename, "New save stored, lock released");
        Ok(ReleaseOutcome::Released)
    }

    /// Read-only view of the current record.
    pub async fn status(&self) -> Result<LockRecord, HostlockError> {
        Ok(self
            .lock_store
            .get()
            .await
            .map_err(storage_err)?
            .unwrap_or_else(LockRecord::initial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hostlock_persistence::{LockState, MemoryBlobStore, MemoryLockStore};

    async fn seeded_manager() -> LockManager {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        blob_store.insert("v1", Bytes::from_static(b"data1")).await;

        let mut record = LockRecord::initial();
        record.saved_filename = "v1".to_string();
        lock_store.set(&record).await.unwrap();

        LockManager::new(lock_store, blob_store)
    }

    #[tokio::test]
    async fn test_acquire_from_free() {
        let manager = seeded_manager().await;

        match manager.acquire("alice").await.unwrap() {
            AcquireOutcome::Acquired(file) => {
                assert_eq!(file.name, "v1");
                assert_eq!(&file.content[..], b"data1");
            }
            other => panic!("expected Acquired, got {:?}", other),
        }

        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Locked);
        assert_eq!(record.holder.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_acquire_while_locked() {
        let manager = seeded_manager().await;
        manager.acquire("alice").await.unwrap();

        match manager.acquire("bob").await.unwrap() {
            AcquireOutcome::AlreadyLocked { holder } => assert_eq!(holder, "alice"),
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }

        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Locked);
        assert_eq!(record.holder.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_release_cycle_round_trip() {
        let manager = seeded_manager().await;
        manager.acquire("alice").await.unwrap();

        let outcome = manager
            .release("v2", Bytes::from_static(b"data2"))
            .await
            .unwrap();
        assert_eq!(outcome, ReleaseOutcome::Released);

        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Free);
        assert_eq!(record.saved_filename, "v2");

        // The next acquire returns exactly the submitted bytes.
        match manager.acquire("bob").await.unwrap() {
            AcquireOutcome::Acquired(file) => {
                assert_eq!(file.name, "v2");
                assert_eq!(&file.content[..], b"data2");
            }
            other => panic!("expected Acquired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_release_without_lock() {
        let manager = seeded_manager().await;

        let outcome = manager
            .release("vX", Bytes::from_static(b"dataX"))
            .await
            .unwrap();
        assert_eq!(outcome, ReleaseOutcome::NotLocked);

        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Free);
        assert_eq!(record.saved_filename, "v1");
    }

    #[tokio::test]
    async fn test_bootstrap_upload_into_empty_store() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        let manager = LockManager::new(lock_store, blob_store);

        // No record exists yet; the first upload seeds the system.
        assert_eq!(
            manager
                .release("v1", Bytes::from_static(b"data1"))
                .await
                .unwrap(),
            ReleaseOutcome::Released
        );

        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Free);
        assert_eq!(record.saved_filename, "v1");

        // And from then on the normal cycle applies.
        match manager.acquire("alice").await.unwrap() {
            AcquireOutcome::Acquired(file) => assert_eq!(&file.content[..], b"data1"),
            other => panic!("expected Acquired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_double_release_second_refused() {
        let manager = seeded_manager().await;
        manager.acquire("alice").await.unwrap();

        assert_eq!(
            manager
                .release("v2", Bytes::from_static(b"data2"))
                .await
                .unwrap(),
            ReleaseOutcome::Released
        );
        assert_eq!(
            manager
                .release("v3", Bytes::from_static(b"data3"))
                .await
                .unwrap(),
            ReleaseOutcome::NotLocked
        );
    }

    #[tokio::test]
    async fn test_concurrent_acquires_single_winner() {
        let manager = Arc::new(seeded_manager().await);

        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.acquire(&format!("player{}", i)).await.unwrap()
            }));
        }

        let mut acquired = 0;
        let mut refused = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AcquireOutcome::Acquired(_) => acquired += 1,
                AcquireOutcome::AlreadyLocked { .. } => refused += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        assert_eq!(acquired, 1);
        assert_eq!(refused, 15);
    }

    #[tokio::test]
    async fn test_acquire_uninitialized_save() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        let manager = LockManager::new(lock_store, blob_store);

        match manager.acquire("alice").await {
            Err(HostlockError::SaveNotInitialized) => {}
            other => panic!("expected SaveNotInitialized, got {:?}", other),
        }

        // The failed acquire left the lock free.
        assert_eq!(manager.status().await.unwrap().state, LockState::Free);
    }

    #[tokio::test]
    async fn test_acquire_missing_blob_is_integrity_error() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());

        let mut record = LockRecord::initial();
        record.saved_filename = "ghost".to_string();
        lock_store.set(&record).await.unwrap();

        let manager = LockManager::new(lock_store, blob_store);
        match manager.acquire("alice").await {
            Err(HostlockError::BlobNotFound(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected BlobNotFound, got {:?}", other),
        }
        assert_eq!(manager.status().await.unwrap().state, LockState::Free);
    }

    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn get(&self, _name: &str) -> anyhow::Result<Option<Bytes>> {
            anyhow::bail!("backend down")
        }

        async fn put(&self, _name: &str, _content: Bytes) -> anyhow::Result<()> {
            anyhow::bail!("backend down")
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_lock_free() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let mut record = LockRecord::initial();
        record.saved_filename = "v1".to_string();
        lock_store.set(&record).await.unwrap();

        let manager = LockManager::new(lock_store, Arc::new(FailingBlobStore));
        match manager.acquire("alice").await {
            Err(HostlockError::StorageUnavailable(_)) => {}
            other => panic!("expected StorageUnavailable, got {:?}", other),
        }
        assert_eq!(manager.status().await.unwrap().state, LockState::Free);
    }

    #[tokio::test]
    async fn test_failed_put_keeps_lock_held() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let mut record = LockRecord::initial();
        record.saved_filename = "v1".to_string();
        record.lock("alice", Utc::now());
        lock_store.set(&record).await.unwrap();

        let manager = LockManager::new(lock_store, Arc::new(FailingBlobStore));
        match manager.release("v2", Bytes::from_static(b"data2")).await {
            Err(HostlockError::StorageUnavailable(_)) => {}
            other => panic!("expected StorageUnavailable, got {:?}", other),
        }

        // The rightful holder can still retry.
        let record = manager.status().await.unwrap();
        assert_eq!(record.state, LockState::Locked);
        assert_eq!(record.holder.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_expired_lease_force_takeover() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        blob_store.insert("v1", Bytes::from_static(b"data1")).await;

        let mut record = LockRecord::initial();
        record.saved_filename = "v1".to_string();
        lock_store.set(&record).await.unwrap();

        let manager = LockManager::new(lock_store, blob_store).with_lease_timeout(0);
        manager.acquire("alice").await.unwrap();

        match manager.acquire("bob").await.unwrap() {
            AcquireOutcome::ForceAcquired {
                file,
                previous_holder,
            } => {
                assert_eq!(previous_holder, "alice");
                assert_eq!(&file.content[..], b"data1");
            }
            other => panic!("expected ForceAcquired, got {:?}", other),
        }

        assert_eq!(
            manager.status().await.unwrap().holder.as_deref(),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn test_unexpired_lease_not_taken_over() {
        let lock_store = Arc::new(MemoryLockStore::new());
        let blob_store = Arc::new(MemoryBlobStore::new());
        blob_store.insert("v1", Bytes::from_static(b"data1")).await;

        let mut record = LockRecord::initial();
        record.saved_filename = "v1".to_string();
        lock_store.set(&record).await.unwrap();

        let manager = LockManager::new(lock_store, blob_store).with_lease_timeout(3600);
        manager.acquire("alice").await.unwrap();

        match manager.acquire("bob").await.unwrap() {
            AcquireOutcome::AlreadyLocked { holder } => assert_eq!(holder, "alice"),
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }
    }
}
