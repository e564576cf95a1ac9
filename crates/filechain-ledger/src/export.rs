use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filechain_types::Payload;

use crate::block::Block;

/// Serialized form of a block.
///
/// This is the wire contract of `/api/blockchain` and exported chain files;
/// field names and nesting round-trip losslessly, so a block rebuilt from a
/// snapshot recomputes a bit-identical digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: Payload,
    pub previous_digest: String,
    pub nonce: u64,
    pub digest: String,
}

impl From<&Block> for BlockSnapshot {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp,
            payload: block.payload.clone(),
            previous_digest: block.previous_digest.clone(),
            nonce: block.nonce,
            digest: block.digest.clone(),
        }
    }
}

impl Block {
    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot::from(self)
    }
}

/// Verbatim conversion: the stored digest is kept, never recomputed.
impl From<BlockSnapshot> for Block {
    fn from(snapshot: BlockSnapshot) -> Self {
        Self {
            index: snapshot.index,
            timestamp: snapshot.timestamp,
            payload: snapshot.payload,
            previous_digest: snapshot.previous_digest,
            nonce: snapshot.nonce,
            digest: snapshot.digest,
        }
    }
}

/// Immutable copy of a ledger's blocks to revert to later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSnapshot {
    blocks: Vec<Block>,
    taken_at: DateTime<Utc>,
}

impl ChainSnapshot {
    pub(crate) fn capture(blocks: &[Block]) -> Self {
        Self {
            blocks: blocks.to_vec(),
            taken_at: Utc::now(),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
