//! File-backed store implementations
//!
//! The lock record lives in a single JSON file, the blobs as plain files in
//! a data directory. Every write lands in a temporary sibling first and is
//! moved into place with an atomic rename, so a crash mid-write leaves the
//! previous version intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use hostlock_common::is_valid_name;

use crate::model::LockRecord;
use crate::traits::{BlobStore, LockStore};

/// Write `content` to `path` through a temporary file and atomic rename.
///
/// The temp name is the full file name plus a `.tmp` suffix, so "a.zip"
/// and "a.bin" never share a temp file and a blob named "a.tmp" is not
/// clobbered by a neighbor's write.
async fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(())
}

/// Lock store backed by a single JSON file
pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    /// Create a store at the given file path, creating parent directories.
    pub async fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        Ok(FileLockStore { path })
    }
}

#[async_trait]
impl LockStore for FileLockStore {
    async fn get(&self) -> anyhow::Result<Option<LockRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let record: LockRecord = serde_json::from_str(&content)
            .with_context(|| format!("parsing lock record at {}", self.path.display()))?;
        Ok(Some(record))
    }

    async fn set(&self, record: &LockRecord) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(record).context("serializing lock record")?;
        write_atomic(&self.path, &json).await?;
        debug!(path = %self.path.display(), state = ?record.state, "Lock record written");
        Ok(())
    }
}

/// Blob store backed by one file per blob under a data directory
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at the given directory, creating it if absent.
    pub async fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
        Ok(FileBlobStore { dir })
    }

    /// Resolve a blob name to its path, rejecting anything that is not a
    /// plain identifier. This is what keeps names from escaping the
    /// data directory.
    fn blob_path(&self, name: &str) -> anyhow::Result<PathBuf> {
        if !is_valid_name(name) {
            bail!("invalid blob name: '{}'", name);
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, name: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.blob_path(name)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn put(&self, name: &str, content: Bytes) -> anyhow::Result<()> {
        let path = self.blob_path(name)?;
        write_atomic(&path, &content).await?;
        debug!(name = %name, size = content.len(), "Blob written");
        Ok(())
    }
}
