use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{content_address_of, BlobStore};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests, demos, and embedding. Blobs are held behind a
/// `RwLock` and verified against their address on read.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, data: &[u8]) -> StoreResult<String> {
        let address = content_address_of(data);
        let mut map = self.blobs.write().map_err(|_| StoreError::LockPoisoned)?;
        map.entry(address.clone()).or_insert_with(|| data.to_vec());
        tracing::debug!(%address, size = data.len(), "blob stored");
        Ok(address)
    }

    fn get(&self, address: &str) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().map_err(|_| StoreError::LockPoisoned)?;
        let Some(data) = map.get(address) else {
            return Ok(None);
        };
        if content_address_of(data) != address {
            return Err(StoreError::Corrupt {
                address: address.to_string(),
            });
        }
        Ok(Some(data.clone()))
    }

    fn contains(&self, address: &str) -> StoreResult<bool> {
        let map = self.blobs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(address))
    }

    fn remove(&self, address: &str) -> StoreResult<bool> {
        let mut map = self.blobs.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(address).is_some())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
