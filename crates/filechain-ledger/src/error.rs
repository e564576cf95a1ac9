/// Errors produced by ledger operations.
///
/// Lookups and removals report "not found" through `Option`/`bool`, and
/// validation reports defects as data; neither uses this type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("integrity violation at block {index}: {reason}")]
    IntegrityViolation { index: u64, reason: String },

    #[error("mining of block {index} cancelled after {attempts} attempts")]
    MiningCancelled { index: u64, attempts: u64 },

    #[error("mining of block {index} timed out after {attempts} attempts")]
    MiningTimedOut { index: u64, attempts: u64 },

    #[error("a chain needs at least a genesis block")]
    EmptyChain,

    #[error("ledger lock poisoned")]
    LockPoisoned,
}
