//! Shared application state

use std::sync::Arc;

use hostlock_core::LockManager;

/// State shared across request handlers
///
/// The secret is loaded once at startup and never persisted next to the
/// lock record.
pub struct AppState {
    pub secret: String,
    pub lock_manager: Arc<LockManager>,
}
