use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};

use filechain_crypto::MiningLimits;
use filechain_types::{Difficulty, FileRecord};

use crate::block::Block;
use crate::error::LedgerError;
use crate::export::{BlockSnapshot, ChainSnapshot};
use crate::ledger::{mine, DeletionPolicy, Ledger};
use crate::validation::ValidationReport;

/// Thread-safe handle to a [`Ledger`].
///
/// Mutations are serialized by a writer lock. Nonce search runs with no
/// ledger lock held, so readers keep seeing the last committed chain while
/// a block is mined; the write lock is taken only to link or swap.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    ledger: Arc<RwLock<Ledger>>,
    writer: Arc<Mutex<()>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Run `f` against the committed chain.
    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T, LedgerError> {
        Ok(f(&*self.read_guard()?))
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Ledger>, LedgerError> {
        self.ledger.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn writer(&self) -> Result<MutexGuard<'_, ()>, LedgerError> {
        self.writer.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Seal `record` and link it. On cancel or timeout nothing is linked.
    pub fn append(
        &self,
        record: FileRecord,
        limits: &MiningLimits,
    ) -> Result<Block, LedgerError> {
        let _writer = self.writer()?;
        let (mut candidate, miner) = {
            let ledger = self.read_guard()?;
            (ledger.prepare(record.into()), ledger.miner().clone())
        };
        mine(&miner, &mut candidate, limits)?;
        let mut ledger = self.ledger.write().map_err(|_| LedgerError::LockPoisoned)?;
        ledger.link(candidate).cloned()
    }

    /// Apply a mutation to a private copy, then publish it in one swap.
    fn mutate<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> Result<T, LedgerError> {
        let _writer = self.writer()?;
        let mut working = self.read_guard()?.clone();
        let out = f(&mut working);
        *self.ledger.write().map_err(|_| LedgerError::LockPoisoned)? = working;
        Ok(out)
    }

    pub fn delete(&self, content_address: &str) -> Result<bool, LedgerError> {
        if self.find(content_address)?.is_none() {
            return Ok(false);
        }
        self.mutate(|ledger| ledger.delete(content_address))
    }

    pub fn remove(&self, content_address: &str) -> Result<bool, LedgerError> {
        if self.find(content_address)?.is_none() {
            return Ok(false);
        }
        self.mutate(|ledger| ledger.remove_by_content_address(content_address))
    }

    pub fn retract(
        &self,
        content_address: &str,
        reason: Option<String>,
    ) -> Result<Option<Block>, LedgerError> {
        if self.find(content_address)?.is_none() {
            return Ok(None);
        }
        self.mutate(|ledger| ledger.retract_by_content_address(content_address, reason))
    }

    pub fn restore(&self, snapshot: &ChainSnapshot) -> Result<(), LedgerError> {
        self.mutate(|ledger| ledger.restore(snapshot))?
    }

    pub fn find(&self, content_address: &str) -> Result<Option<FileRecord>, LedgerError> {
        self.read(|l| l.find_by_content_address(content_address).cloned())
    }

    pub fn block_of(&self, content_address: &str) -> Result<Option<Block>, LedgerError> {
        self.read(|l| l.block_of(content_address).cloned())
    }

    pub fn list_records(&self) -> Result<Vec<FileRecord>, LedgerError> {
        self.read(|l| l.list_all_records().into_iter().cloned().collect())
    }

    pub fn validate(&self) -> Result<ValidationReport, LedgerError> {
        self.read(Ledger::validate)
    }

    pub fn export(&self) -> Result<Vec<BlockSnapshot>, LedgerError> {
        self.read(Ledger::export)
    }

    pub fn snapshot(&self) -> Result<ChainSnapshot, LedgerError> {
        self.read(Ledger::snapshot)
    }

    pub fn block_count(&self) -> Result<usize, LedgerError> {
        self.read(Ledger::block_count)
    }

    pub fn difficulty(&self) -> Result<Difficulty, LedgerError> {
        self.read(Ledger::difficulty)
    }

    pub fn deletion_policy(&self) -> Result<DeletionPolicy, LedgerError> {
        self.read(Ledger::deletion_policy)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use filechain_crypto::CancelFlag;

    use super::*;

    fn shared(d: u32) -> SharedLedger {
        SharedLedger::new(Ledger::new(Difficulty::try_from(d).unwrap()))
    }

    fn record(i: usize) -> FileRecord {
        FileRecord::new(format!("f{i}.txt"), i as u64, format!("Qm{i}"))
    }

    #[test]
    fn concurrent_appends_stay_dense_and_valid() {
        let ledger = shared(1);
        thread::scope(|s| {
            for t in 0..4 {
                let ledger = ledger.clone();
                s.spawn(move || {
                    for i in 0..5 {
                        ledger
                            .append(record(t * 10 + i), &MiningLimits::unbounded())
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.block_count().unwrap(), 21);
        let report = ledger.validate().unwrap();
        assert!(report.is_valid);
        let indices: HashSet<u64> = ledger.export().unwrap().iter().map(|b| b.index).collect();
        assert_eq!(indices.len(), 21);
    }

    #[test]
    fn readers_run_alongside_writers() {
        let ledger = shared(1);
        thread::scope(|s| {
            let writer = ledger.clone();
            s.spawn(move || {
                for i in 0..10 {
                    writer.append(record(i), &MiningLimits::unbounded()).unwrap();
                }
            });
            for _ in 0..3 {
                let reader = ledger.clone();
                s.spawn(move || {
                    for _ in 0..20 {
                        assert!(reader.validate().unwrap().is_valid);
                    }
                });
            }
        });
        assert_eq!(ledger.list_records().unwrap().len(), 10);
    }

    #[test]
    fn cancelled_append_leaves_chain_untouched() {
        // Difficulty 64 is unreachable, so only the flag can end the search.
        let genesis_only = Ledger::new(Difficulty::ZERO).export();
        let ledger = SharedLedger::new(
            Ledger::from_snapshots(Difficulty::try_from(64).unwrap(), genesis_only).unwrap(),
        );
        let flag = CancelFlag::new();
        flag.cancel();
        let err = ledger
            .append(record(1), &MiningLimits::unbounded().with_cancel(flag))
            .unwrap_err();
        assert!(matches!(err, LedgerError::MiningCancelled { .. }));
        assert_eq!(ledger.block_count().unwrap(), 1);
    }

    #[test]
    fn delete_uses_configured_policy() {
        let ledger = SharedLedger::new(
            Ledger::new(Difficulty::ZERO).with_deletion_policy(DeletionPolicy::Rebuild),
        );
        ledger.append(record(1), &MiningLimits::unbounded()).unwrap();
        ledger.append(record(2), &MiningLimits::unbounded()).unwrap();

        assert!(ledger.delete("Qm1").unwrap());
        assert!(!ledger.delete("Qm1").unwrap());
        assert_eq!(ledger.block_count().unwrap(), 2);
        assert_eq!(ledger.block_of("Qm2").unwrap().unwrap().index, 1);
        assert!(ledger.validate().unwrap().is_valid);
    }

    #[test]
    fn retract_then_restore() {
        let ledger = shared(0);
        ledger.append(record(1), &MiningLimits::unbounded()).unwrap();
        let snapshot = ledger.snapshot().unwrap();

        let tombstone = ledger.retract("Qm1", Some("mistake".into())).unwrap().unwrap();
        assert_eq!(tombstone.index, 2);
        assert!(ledger.find("Qm1").unwrap().is_none());
        assert!(ledger.retract("Qm1", None).unwrap().is_none());

        ledger.restore(&snapshot).unwrap();
        assert!(ledger.find("Qm1").unwrap().is_some());
        assert_eq!(ledger.block_count().unwrap(), 2);
    }

    #[test]
    fn remove_missing_address_is_false() {
        let ledger = shared(0);
        assert!(!ledger.remove("QmNope").unwrap());
    }
}
