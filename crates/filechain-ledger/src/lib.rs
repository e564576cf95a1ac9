//! Append-only, tamper-evident ledger of content-addressed file records.
//!
//! This crate is the heart of filechain. It provides:
//! - [`Block`] with deterministic SHA-256 digests over a canonical encoding
//! - [`Ledger`]: proof-of-work sealed append, lookup by content address,
//!   hard delete with chain rebuild, and tombstone retraction
//! - Non-short-circuiting validation with per-block diagnostics
//! - Lossless export/import and immutable snapshot/restore
//! - [`SharedLedger`]: single-writer, multi-reader wrapper that mines
//!   without holding the ledger lock
//!
//! The ledger is single-process and held in memory. Proof-of-work is a local
//! difficulty gate, not a consensus mechanism.

pub mod block;
pub mod error;
pub mod export;
mod index;
pub mod ledger;
pub mod shared;
pub mod validation;

pub use block::{Block, GENESIS_PREVIOUS_DIGEST};
pub use error::LedgerError;
pub use export::{BlockSnapshot, ChainSnapshot};
pub use ledger::{DeletionPolicy, Ledger};
pub use shared::SharedLedger;
pub use validation::{validate_chain, BlockReport, BlockStatus, Issue, IssueKind, ValidationReport};

pub use filechain_crypto::{CancelFlag, Miner, MiningLimits};
pub use filechain_types::{Difficulty, FileRecord, Payload, Tombstone};
