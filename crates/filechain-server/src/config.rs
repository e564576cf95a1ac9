use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use filechain_ledger::{DeletionPolicy, Difficulty, Ledger, Miner};

use crate::error::{ServerError, ServerResult};

/// Server settings, loadable from TOML. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub difficulty: Difficulty,
    pub deletion_policy: DeletionPolicy,
    pub mining_workers: usize,
    pub mining_timeout_ms: u64,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5001)),
            difficulty: Difficulty::default(),
            deletion_policy: DeletionPolicy::default(),
            mining_workers: 1,
            mining_timeout_ms: 30_000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn mining_timeout(&self) -> Duration {
        Duration::from_millis(self.mining_timeout_ms)
    }

    /// Fresh ledger with a mined genesis block and these mining settings.
    pub fn build_ledger(&self) -> Ledger {
        Ledger::with_miner(Miner::new(self.difficulty).with_workers(self.mining_workers))
            .with_deletion_policy(self.deletion_policy)
    }
}
