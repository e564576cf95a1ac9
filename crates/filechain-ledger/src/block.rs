use chrono::{DateTime, Utc};
use serde_json::json;

use filechain_crypto::{Seal, SealTemplate};
use filechain_types::{canonical_time, Difficulty, Payload};

/// `previous_digest` of the genesis block.
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";

/// One position in the chain.
///
/// `digest` is the SHA-256 of the canonical encoding of the other five
/// fields. The encoding is compact JSON with keys sorted at every level:
///
/// ```text
/// {"index":N,"nonce":N,"payload":{..},"previous_digest":"..","timestamp":".."}
/// ```
///
/// Fields are public so callers can inspect them; mutating one without
/// [`Block::reseal`] leaves the block detectably unsealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
    pub previous_digest: String,
    pub nonce: u64,
    pub digest: String,
}

impl Block {
    /// Build a block and compute its digest immediately. No range checks.
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: Payload,
        previous_digest: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            payload,
            previous_digest: previous_digest.into(),
            nonce,
            digest: String::new(),
        };
        block.reseal();
        block
    }

    /// Unsealed genesis block (nonce 0).
    pub fn genesis(timestamp: DateTime<Utc>) -> Self {
        Self::new(0, timestamp, Payload::genesis(), GENESIS_PREVIOUS_DIGEST, 0)
    }

    /// Canonical encoding split around the nonce.
    pub fn seal_template(&self) -> SealTemplate {
        let head = format!("{{\"index\":{},\"nonce\":", self.index);
        let rest = json!({
            "payload": self.payload.canonical_value(),
            "previous_digest": self.previous_digest,
            "timestamp": canonical_time(&self.timestamp),
        })
        .to_string();
        // `rest` is a JSON object, so it always opens with `{`.
        let tail = format!(",{}", &rest[1..]);
        SealTemplate::new(head.as_bytes(), tail)
    }

    /// Full canonical encoding, the exact bytes the digest is taken over.
    pub fn canonical_encoding(&self) -> String {
        json!({
            "index": self.index,
            "nonce": self.nonce,
            "payload": self.payload.canonical_value(),
            "previous_digest": self.previous_digest,
            "timestamp": canonical_time(&self.timestamp),
        })
        .to_string()
    }

    /// Digest of the current field values.
    pub fn compute_digest(&self) -> String {
        self.seal_template().digest(self.nonce)
    }

    /// Recompute `digest` from the current field values.
    pub fn reseal(&mut self) {
        self.digest = self.compute_digest();
    }

    /// Adopt a nonce found by the miner.
    pub fn apply_seal(&mut self, seal: Seal) {
        self.nonce = seal.nonce;
        self.digest = seal.digest;
    }

    /// Digest is intact and meets `difficulty`.
    pub fn is_sealed(&self, difficulty: Difficulty) -> bool {
        self.digest == self.compute_digest() && difficulty.is_met_by(&self.digest)
    }
}
