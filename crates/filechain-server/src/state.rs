use std::sync::Arc;

use filechain_ledger::SharedLedger;
use filechain_store::{BlobStore, InMemoryBlobStore};
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared handler state: the ledger, the blob store holding file bytes, and
/// the settings the server was started with.
#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub store: Arc<dyn BlobStore>,
    pub config: Arc<ServerConfig>,
    /// Held from blob write to link on upload, and from unlink to blob
    /// cleanup on delete, so cleanup never drops bytes a new record needs.
    pub blob_gate: Arc<Mutex<()>>,
}

impl AppState {
    /// Fresh ledger per `config`, backed by an in-memory blob store.
    pub fn new(config: ServerConfig) -> Self {
        let ledger = SharedLedger::new(config.build_ledger());
        Self::from_parts(ledger, Arc::new(InMemoryBlobStore::new()), config)
    }

    pub fn from_parts(
        ledger: SharedLedger,
        store: Arc<dyn BlobStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            ledger,
            store,
            config: Arc::new(config),
            blob_gate: Arc::new(Mutex::new(())),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ledger", &self.ledger)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
