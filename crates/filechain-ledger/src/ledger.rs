use chrono::Utc;
use serde::{Deserialize, Serialize};

use filechain_crypto::{Miner, MiningLimits, MiningOutcome};
use filechain_types::{Difficulty, FileRecord, Payload, Tombstone};

use crate::block::Block;
use crate::error::LedgerError;
use crate::export::{BlockSnapshot, ChainSnapshot};
use crate::index::ContentIndex;
use crate::validation::{validate_chain, ValidationReport};

/// How [`Ledger::delete`] removes a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// Drop the block and re-mine every block after it.
    Rebuild,
    /// Append a tombstone; history is never rewritten.
    #[default]
    Tombstone,
}

impl std::fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rebuild => write!(f, "rebuild"),
            Self::Tombstone => write!(f, "tombstone"),
        }
    }
}

/// Ordered, proof-of-work sealed chain of file records.
///
/// Block 0 is the genesis block, mined at construction and never removed.
/// The ledger is single-writer; see [`crate::SharedLedger`] for concurrent
/// callers.
#[derive(Clone, Debug)]
pub struct Ledger {
    blocks: Vec<Block>,
    difficulty: Difficulty,
    miner: Miner,
    deletion: DeletionPolicy,
    index: ContentIndex,
}

impl Ledger {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_miner(Miner::new(difficulty))
    }

    /// Build a ledger whose difficulty is the miner's.
    pub fn with_miner(miner: Miner) -> Self {
        let mut genesis = Block::genesis(Utc::now());
        mine_unbounded(&miner, &mut genesis);
        tracing::debug!(digest = %genesis.digest, "genesis block sealed");
        Self {
            blocks: vec![genesis],
            difficulty: miner.difficulty(),
            miner,
            deletion: DeletionPolicy::default(),
            index: ContentIndex::default(),
        }
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion = policy;
        self
    }

    /// Rebuild a ledger from exported snapshots, verbatim.
    ///
    /// Nothing is resealed; defects in the input surface through
    /// [`Ledger::validate`].
    pub fn from_snapshots(
        difficulty: Difficulty,
        snapshots: Vec<BlockSnapshot>,
    ) -> Result<Self, LedgerError> {
        if snapshots.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        let blocks: Vec<Block> = snapshots.into_iter().map(Block::from).collect();
        tracing::info!(blocks = blocks.len(), "ledger imported");
        Ok(Self {
            index: ContentIndex::rebuild(&blocks),
            blocks,
            difficulty,
            miner: Miner::new(difficulty),
            deletion: DeletionPolicy::default(),
        })
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn miner(&self) -> &Miner {
        &self.miner
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.deletion
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Unsealed candidate for the next position, linked to the current tip.
    pub fn prepare(&self, payload: Payload) -> Block {
        let tip = self.tip();
        Block::new(
            tip.index + 1,
            Utc::now(),
            payload,
            tip.digest.clone(),
            0,
        )
    }

    /// Link a block sealed elsewhere. The block must extend the current tip
    /// and carry an intact, sufficiently worked digest.
    pub fn link(&mut self, block: Block) -> Result<&Block, LedgerError> {
        let expected_index = self.tip().index + 1;
        let reason = if block.index != expected_index {
            Some(format!("expected index {expected_index}, got {}", block.index))
        } else if block.previous_digest != self.tip().digest {
            Some("previous digest does not match the tip".to_string())
        } else if block.digest != block.compute_digest() {
            Some("digest does not match block contents".to_string())
        } else if !self.difficulty.is_met_by(&block.digest) {
            Some(format!(
                "digest does not start with {:?}",
                self.difficulty.target_prefix()
            ))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(LedgerError::IntegrityViolation {
                index: block.index,
                reason,
            });
        }
        Ok(self.push_sealed(block))
    }

    /// Seal `record` into a new block and link it. Mining is unbounded.
    pub fn append(&mut self, record: FileRecord) -> Block {
        self.append_payload(record.into())
    }

    pub fn append_payload(&mut self, payload: Payload) -> Block {
        let mut block = self.prepare(payload);
        mine_unbounded(&self.miner, &mut block);
        self.push_sealed(block).clone()
    }

    /// Like [`Ledger::append`], but gives up when `limits` stop the search.
    /// A block that was not sealed is discarded and never linked.
    pub fn append_within(
        &mut self,
        record: FileRecord,
        limits: &MiningLimits,
    ) -> Result<Block, LedgerError> {
        let mut block = self.prepare(record.into());
        mine(&self.miner, &mut block, limits)?;
        Ok(self.push_sealed(block).clone())
    }

    fn push_sealed(&mut self, block: Block) -> &Block {
        tracing::debug!(
            index = block.index,
            nonce = block.nonce,
            kind = block.payload.kind(),
            digest = %block.digest,
            "block linked"
        );
        let position = self.blocks.len();
        self.index.observe(position, &block.payload);
        self.blocks.push(block);
        &self.blocks[position]
    }

    pub fn validate(&self) -> ValidationReport {
        validate_chain(&self.blocks, self.difficulty)
    }

    /// First live record with `content_address`, in chain order.
    pub fn find_by_content_address(&self, content_address: &str) -> Option<&FileRecord> {
        self.block_of(content_address)
            .and_then(|block| block.payload.as_file())
    }

    /// Block holding the first live record with `content_address`.
    pub fn block_of(&self, content_address: &str) -> Option<&Block> {
        let position = self.index.get(content_address)?;
        self.blocks
            .get(position)
            .filter(|block| {
                block
                    .payload
                    .as_file()
                    .is_some_and(|r| r.content_address == content_address)
            })
    }

    /// Live file records in chain order.
    ///
    /// Genesis and tombstones are never listed, nor is any record retracted
    /// by a later tombstone.
    pub fn list_all_records(&self) -> Vec<&FileRecord> {
        let mut retracted = std::collections::HashSet::new();
        let mut records = Vec::new();
        for block in self.blocks.iter().rev() {
            match &block.payload {
                Payload::Tombstone(t) => {
                    retracted.insert(t.content_address.as_str());
                }
                Payload::File(record) if !retracted.contains(record.content_address.as_str()) => {
                    records.push(record);
                }
                _ => {}
            }
        }
        records.reverse();
        records
    }

    /// Hard delete: drop the block holding `content_address` and re-mine
    /// every block after it so the chain stays contiguous.
    ///
    /// Returns `false` without touching the chain when nothing matches.
    pub fn remove_by_content_address(&mut self, content_address: &str) -> bool {
        let Some(position) = self.index.get(content_address) else {
            return false;
        };

        let mut removed = self.blocks.split_off(position).into_iter();
        removed.next();
        let tail: Vec<Payload> = removed.map(|block| block.payload).collect();
        self.index = ContentIndex::rebuild(&self.blocks);

        let rebuilt = tail.len();
        for payload in tail {
            self.append_payload(payload);
        }
        tracing::info!(
            content_address,
            position,
            rebuilt,
            "record removed; chain rebuilt"
        );
        true
    }

    /// Append a tombstone retracting the live record with `content_address`.
    ///
    /// Returns `None` when no live record matches.
    pub fn retract_by_content_address(
        &mut self,
        content_address: &str,
        reason: Option<String>,
    ) -> Option<Block> {
        self.index.get(content_address)?;
        let block = self.append_payload(
            Tombstone {
                content_address: content_address.to_string(),
                reason,
            }
            .into(),
        );
        tracing::info!(content_address, index = block.index, "record retracted");
        Some(block)
    }

    /// Remove a record using the configured [`DeletionPolicy`].
    pub fn delete(&mut self, content_address: &str) -> bool {
        match self.deletion {
            DeletionPolicy::Rebuild => self.remove_by_content_address(content_address),
            DeletionPolicy::Tombstone => self
                .retract_by_content_address(content_address, None)
                .is_some(),
        }
    }

    pub fn export(&self) -> Vec<BlockSnapshot> {
        self.blocks.iter().map(BlockSnapshot::from).collect()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::capture(&self.blocks)
    }

    /// Replace the chain with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: &ChainSnapshot) -> Result<(), LedgerError> {
        if snapshot.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        self.blocks = snapshot.blocks().to_vec();
        self.index = ContentIndex::rebuild(&self.blocks);
        tracing::info!(
            blocks = self.blocks.len(),
            taken_at = %snapshot.taken_at(),
            "ledger restored from snapshot"
        );
        Ok(())
    }
}

/// Seal `block` within `limits`.
pub(crate) fn mine(
    miner: &Miner,
    block: &mut Block,
    limits: &MiningLimits,
) -> Result<(), LedgerError> {
    match miner.seal(&block.seal_template(), block.nonce, limits) {
        MiningOutcome::Sealed(seal) => {
            block.apply_seal(seal);
            Ok(())
        }
        MiningOutcome::Cancelled { attempts } => Err(LedgerError::MiningCancelled {
            index: block.index,
            attempts,
        }),
        MiningOutcome::TimedOut { attempts } => Err(LedgerError::MiningTimedOut {
            index: block.index,
            attempts,
        }),
    }
}

/// Seal `block` with no deadline and no cancellation.
fn mine_unbounded(miner: &Miner, block: &mut Block) {
    let template = block.seal_template();
    loop {
        // Unbounded limits never stop the search.
        if let MiningOutcome::Sealed(seal) =
            miner.seal(&template, block.nonce, &MiningLimits::unbounded())
        {
            block.apply_seal(seal);
            return;
        }
    }
}
