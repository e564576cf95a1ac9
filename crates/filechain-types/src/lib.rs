//! Foundation types for filechain.
//!
//! This crate provides the value types every other filechain crate builds on.
//! None of them carry behavior beyond construction, canonical encoding, and
//! caller-side validation helpers.
//!
//! # Key Types
//!
//! - [`FileRecord`]: Metadata binding a file to its content address
//! - [`Tombstone`]: Append-only retraction of an earlier record
//! - [`Payload`]: Tagged block payload: genesis, file, or tombstone
//! - [`Difficulty`]: Required number of leading zero hex characters

pub mod difficulty;
pub mod error;
pub mod payload;
pub mod record;

pub use difficulty::Difficulty;
pub use error::TypeError;
pub use payload::{Payload, Tombstone, GENESIS_MESSAGE};
pub use record::{canonical_time, FileRecord, ANONYMOUS_UPLOADER};
