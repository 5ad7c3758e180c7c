//! Hostlock Core - the lock state machine
//!
//! `LockManager` coordinates exclusive access to the single shared save:
//! downloading it acquires the lock, uploading a new version releases it.

pub mod manager;

pub use manager::{AcquireOutcome, LockManager, ReleaseOutcome, SaveFile};
