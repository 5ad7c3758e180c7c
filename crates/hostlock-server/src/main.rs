//! Main entry point for the hostlock server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use hostlock_core::LockManager;
use hostlock_persistence::{
    BlobStore, FileBlobStore, FileLockStore, LockStore, MemoryBlobStore, MemoryLockStore,
};
use hostlock_server::{
    model::{AppState, Configuration},
    startup,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let configuration = Configuration::new()?;
    let _logging_guard = startup::init_logging(configuration.log_dir().as_deref())?;

    let secret = configuration.secret()?;
    let address = configuration.server_address();
    let port = configuration.server_port();

    let (lock_store, blob_store): (Arc<dyn LockStore>, Arc<dyn BlobStore>) =
        match configuration.data_dir() {
            Some(dir) => {
                info!("Using file-backed stores under {}", dir);
                let base = PathBuf::from(dir);
                (
                    Arc::new(FileLockStore::new(base.join("lock.json")).await?),
                    Arc::new(FileBlobStore::new(base.join("saves")).await?),
                )
            }
            None => {
                warn!("No data directory configured, using in-memory stores; state will not survive a restart");
                (
                    Arc::new(MemoryLockStore::new()),
                    Arc::new(MemoryBlobStore::new()),
                )
            }
        };

    let mut lock_manager = LockManager::new(lock_store, blob_store);
    if let Some(secs) = configuration.lease_timeout_secs() {
        info!(secs, "Lock lease expiry enabled");
        lock_manager = lock_manager.with_lease_timeout(secs);
    }

    let app_state = Arc::new(AppState {
        secret,
        lock_manager: Arc::new(lock_manager),
    });

    info!("Starting hostlock server on {}:{}", address, port);
    let server = startup::run_server(app_state, address, port)?;

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = startup::shutdown_signal() => {
            info!("Hostlock server shutting down gracefully");
        }
    }

    Ok(())
}
