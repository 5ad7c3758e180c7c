//! Hostlock Persistence - durable state abstractions
//!
//! This crate provides:
//! - `LockStore` / `BlobStore` trait abstractions over the two shared
//!   mutable resources (the singleton lock record and the save payloads)
//! - A file-backed implementation for real deployments
//! - An in-memory implementation for tests and throwaway setups
//!
//! Neither store offers compare-and-swap; `hostlock-core` serializes the
//! read-modify-write sequence above them.

pub mod file;
pub mod memory;
pub mod model;
pub mod traits;

pub use file::{FileBlobStore, FileLockStore};
pub use memory::{MemoryBlobStore, MemoryLockStore};
pub use model::{LockRecord, LockState, SAVED_FILENAME_INIT};
pub use traits::{BlobStore, LockStore};
