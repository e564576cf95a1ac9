use serde::{Deserialize, Serialize};

use filechain_types::Difficulty;

use crate::block::{Block, GENESIS_PREVIOUS_DIGEST};

/// Outcome for one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Valid,
    Invalid,
}

/// Which part of the chain invariant a block breaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Genesis index is not 0 or its previous digest is not `"0"`.
    GenesisStructure,
    /// Index is not the predecessor's index plus one.
    IndexMismatch,
    /// `previous_digest` differs from the predecessor's digest.
    BrokenLink,
    /// Stored digest differs from the recomputed one.
    DigestMismatch,
    /// Digest lacks the required leading zeros.
    InsufficientWork,
}

/// A specific defect found in a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Diagnostics for one block. `block_index` is the block's chain position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport {
    pub block_index: usize,
    pub status: BlockStatus,
    pub issues: Vec<Issue>,
}

impl BlockReport {
    fn from_issues(block_index: usize, issues: Vec<Issue>) -> Self {
        let status = if issues.is_empty() {
            BlockStatus::Valid
        } else {
            BlockStatus::Invalid
        };
        Self {
            block_index,
            status,
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == BlockStatus::Valid
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }
}

/// Result of a full-chain walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub total_blocks: usize,
    pub valid_blocks: usize,
    pub invalid_blocks: usize,
    pub blocks: Vec<BlockReport>,
}

impl ValidationReport {
    /// Positions of every block with at least one issue.
    pub fn invalid_indices(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .filter(|b| !b.is_valid())
            .map(|b| b.block_index)
            .collect()
    }

    pub fn block(&self, block_index: usize) -> Option<&BlockReport> {
        self.blocks.get(block_index)
    }
}

/// Check every block against the chain invariant.
///
/// Never stops at the first defect: each block is checked independently and
/// every issue is recorded. A chain without a genesis block is invalid.
pub fn validate_chain(blocks: &[Block], difficulty: Difficulty) -> ValidationReport {
    let mut reports = Vec::with_capacity(blocks.len());

    for (position, block) in blocks.iter().enumerate() {
        let mut issues = Vec::new();

        match position.checked_sub(1).map(|p| &blocks[p]) {
            None => {
                if block.index != 0 || block.previous_digest != GENESIS_PREVIOUS_DIGEST {
                    issues.push(Issue::new(
                        IssueKind::GenesisStructure,
                        "Genesis block structure is invalid",
                    ));
                }
            }
            Some(previous) => {
                let expected = previous.index.wrapping_add(1);
                if block.index != expected {
                    issues.push(Issue::new(
                        IssueKind::IndexMismatch,
                        format!("Block index mismatch: expected {expected}, got {}", block.index),
                    ));
                }
                if block.previous_digest != previous.digest {
                    issues.push(Issue::new(
                        IssueKind::BrokenLink,
                        "Previous digest doesn't match the previous block's digest",
                    ));
                }
            }
        }

        if block.digest != block.compute_digest() {
            issues.push(Issue::new(
                IssueKind::DigestMismatch,
                "Block digest doesn't match its computed digest",
            ));
        }

        if !difficulty.is_met_by(&block.digest) {
            issues.push(Issue::new(
                IssueKind::InsufficientWork,
                format!(
                    "Proof-of-work invalid: digest doesn't start with {difficulty} zeros"
                ),
            ));
        }

        if !issues.is_empty() {
            tracing::warn!(
                block = position,
                issues = issues.len(),
                "block failed validation"
            );
        }
        reports.push(BlockReport::from_issues(position, issues));
    }

    let invalid_blocks = reports.iter().filter(|r| !r.is_valid()).count();
    let report = ValidationReport {
        is_valid: invalid_blocks == 0 && !reports.is_empty(),
        total_blocks: reports.len(),
        valid_blocks: reports.len() - invalid_blocks,
        invalid_blocks,
        blocks: reports,
    };
    tracing::info!(
        total = report.total_blocks,
        invalid = report.invalid_blocks,
        valid = report.is_valid,
        "chain validated"
    );
    report
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use filechain_types::FileRecord;

    use super::*;

    /// Difficulty-0 chain built by hand so each check can be exercised alone.
    fn chain(len: usize) -> Vec<Block> {
        let mut blocks = vec![Block::genesis(Utc::now())];
        for i in 1..len {
            let prev = blocks[i - 1].digest.clone();
            let record = FileRecord::new(format!("f{i}.txt"), i as u64, format!("Qm{i}"));
            blocks.push(Block::new(i as u64, Utc::now(), record.into(), prev, 0));
        }
        blocks
    }

    #[test]
    fn intact_chain_is_valid() {
        let report = validate_chain(&chain(4), Difficulty::ZERO);
        assert!(report.is_valid);
        assert_eq!(report.total_blocks, 4);
        assert_eq!(report.valid_blocks, 4);
        assert_eq!(report.invalid_blocks, 0);
        assert!(report.invalid_indices().is_empty());
    }

    #[test]
    fn empty_chain_is_invalid() {
        let report = validate_chain(&[], Difficulty::ZERO);
        assert!(!report.is_valid);
        assert_eq!(report.total_blocks, 0);
    }

    #[test]
    fn genesis_structure_is_a_single_issue() {
        let mut blocks = chain(2);
        blocks[0].index = 7;
        blocks[0].previous_digest = "x".into();
        blocks[0].reseal();
        // Keep the link intact so only genesis is at fault.
        blocks[1].previous_digest = blocks[0].digest.clone();
        blocks[1].index = 8;
        blocks[1].reseal();

        let report = validate_chain(&blocks, Difficulty::ZERO);
        let genesis = report.block(0).unwrap();
        assert_eq!(genesis.issues.len(), 1);
        assert!(genesis.has(IssueKind::GenesisStructure));
        assert!(report.block(1).unwrap().is_valid());
    }

    #[test]
    fn index_gap_is_reported() {
        let mut blocks = chain(3);
        blocks[2].index = 5;
        blocks[2].reseal();
        let report = validate_chain(&blocks, Difficulty::ZERO);
        let bad = report.block(2).unwrap();
        assert_eq!(bad.issues.len(), 1);
        assert!(bad.has(IssueKind::IndexMismatch));
        assert_eq!(bad.issues[0].message, "Block index mismatch: expected 2, got 5");
    }

    #[test]
    fn every_issue_of_a_block_is_listed() {
        let mut blocks = chain(3);
        blocks[1].index = 9;
        blocks[1].previous_digest = "BROKEN_CHAIN_LINK_123".into();
        blocks[1].digest = "0000TAMPERED_HASH_DEMO".into();
        let report = validate_chain(&blocks, Difficulty::try_from(5).unwrap());
        let bad = report.block(1).unwrap();
        assert!(bad.has(IssueKind::IndexMismatch));
        assert!(bad.has(IssueKind::BrokenLink));
        assert!(bad.has(IssueKind::DigestMismatch));
        assert!(bad.has(IssueKind::InsufficientWork));
    }

    #[test]
    fn does_not_stop_at_first_invalid_block() {
        let mut blocks = chain(4);
        blocks[1].payload.as_file_mut().unwrap().size_bytes = 999_999_999;
        blocks[3].payload.as_file_mut().unwrap().size_bytes = 999_999_999;
        let report = validate_chain(&blocks, Difficulty::ZERO);
        assert_eq!(report.invalid_indices(), vec![1, 3]);
        assert_eq!(report.invalid_blocks, 2);
        assert_eq!(report.valid_blocks, 2);
        assert!(!report.is_valid);
    }

    #[test]
    fn report_serializes_for_api_consumers() {
        let report = validate_chain(&chain(2), Difficulty::ZERO);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["is_valid"], true);
        assert_eq!(json["blocks"][1]["status"], "Valid");
    }
}
