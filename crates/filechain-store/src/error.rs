/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Stored bytes no longer hash to their address.
    #[error("corrupt blob {address}: content hash mismatch")]
    Corrupt { address: String },

    /// Lock poisoned by a panicking writer.
    #[error("blob store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
