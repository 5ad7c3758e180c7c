//! Store traits for the shared mutable resources
//!
//! All coordination state lives behind these two narrow contracts; nothing
//! in the service bypasses them.

pub mod blob;
pub mod lock;

pub use blob::BlobStore;
pub use lock::LockStore;
