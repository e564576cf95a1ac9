//! Content-addressed blob storage for filechain.
//!
//! The ledger never touches file bytes; it records the opaque address a blob
//! store hands back. This crate defines that collaborator boundary and an
//! in-memory backend.
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written: the same bytes always produce the
//!    same address, so writes are idempotent.
//! 2. The store never interprets blob contents.
//! 3. Backend failures are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBlobStore;
pub use traits::{content_address_of, BlobStore, ADDRESS_PREFIX};
