use crate::error::StoreResult;

/// Prefix marking BLAKE3-derived content addresses.
pub const ADDRESS_PREFIX: &str = "b3-";

/// Content address of `data`: `b3-` followed by its BLAKE3 hex hash.
pub fn content_address_of(data: &[u8]) -> String {
    format!("{ADDRESS_PREFIX}{}", blake3::hash(data).to_hex())
}

/// Content-addressed blob store.
///
/// Implementations must satisfy these invariants:
/// - `put` is idempotent: identical bytes yield the identical address.
/// - `get` returns `Ok(None)` for unknown addresses and `Err` only on
///   backend failure or corruption.
/// - Concurrent reads are always safe.
pub trait BlobStore: Send + Sync {
    /// Store `data` and return its content address.
    fn put(&self, data: &[u8]) -> StoreResult<String>;

    /// Fetch the bytes stored under `address`.
    fn get(&self, address: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether `address` is present.
    fn contains(&self, address: &str) -> StoreResult<bool> {
        Ok(self.get(address)?.is_some())
    }

    /// Drop the blob under `address`. Returns `true` if it existed.
    fn remove(&self, address: &str) -> StoreResult<bool>;
}
