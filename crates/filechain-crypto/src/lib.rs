//! Cryptographic primitives for filechain.
//!
//! Provides SHA-256 hex digests, a nonce-splittable [`SealTemplate`] over a
//! block's canonical encoding, and the proof-of-work [`Miner`].
//!
//! All hashing wraps established libraries; there is no custom cryptography.

pub mod digest;
pub mod miner;
pub mod seal;

pub use digest::{sha256_hex, DIGEST_HEX_LEN};
pub use miner::{CancelFlag, Miner, MiningLimits, MiningOutcome, Seal};
pub use seal::SealTemplate;
