use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use filechain_types::Difficulty;

use crate::seal::SealTemplate;

/// Attempts between checks of the deadline and cancel flag.
const POLL_INTERVAL: u64 = 1024;

/// Shared flag that asks an in-flight search to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Bounds on a single nonce search.
#[derive(Clone, Debug, Default)]
pub struct MiningLimits {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl MiningLimits {
    /// No deadline and no cancellation.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn stop_reason(&self) -> Option<Stop> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Some(Stop::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Stop::TimedOut),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Stop {
    Cancelled,
    TimedOut,
}

impl Stop {
    fn outcome(self, attempts: u64) -> MiningOutcome {
        match self {
            Self::Cancelled => MiningOutcome::Cancelled { attempts },
            Self::TimedOut => MiningOutcome::TimedOut { attempts },
        }
    }
}

/// A nonce whose digest meets the difficulty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seal {
    pub nonce: u64,
    pub digest: String,
    pub attempts: u64,
}

/// Result of a nonce search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MiningOutcome {
    Sealed(Seal),
    Cancelled { attempts: u64 },
    TimedOut { attempts: u64 },
}

impl MiningOutcome {
    pub fn seal(self) -> Option<Seal> {
        match self {
            Self::Sealed(seal) => Some(seal),
            _ => None,
        }
    }
}

/// Proof-of-work search over a [`SealTemplate`].
///
/// Local and non-competitive: the search is a plain nonce counter. With more
/// than one worker the nonce space is strided across scoped threads and the
/// first worker to succeed wins.
#[derive(Clone, Debug)]
pub struct Miner {
    difficulty: Difficulty,
    workers: usize,
}

impl Miner {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            workers: 1,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Search nonces from `start_nonce` until the digest meets the difficulty
    /// or the limits stop the search.
    pub fn seal(
        &self,
        template: &SealTemplate,
        start_nonce: u64,
        limits: &MiningLimits,
    ) -> MiningOutcome {
        let started = Instant::now();
        let outcome = if self.workers == 1 {
            self.seal_serial(template, start_nonce, limits)
        } else {
            self.seal_parallel(template, start_nonce, limits)
        };
        match &outcome {
            MiningOutcome::Sealed(seal) => tracing::trace!(
                nonce = seal.nonce,
                attempts = seal.attempts,
                expected = self.difficulty.expected_attempts(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "nonce found"
            ),
            other => tracing::debug!(?other, "nonce search stopped"),
        }
        outcome
    }

    fn seal_serial(
        &self,
        template: &SealTemplate,
        start_nonce: u64,
        limits: &MiningLimits,
    ) -> MiningOutcome {
        let mut nonce = start_nonce;
        let mut attempts = 0u64;
        loop {
            if attempts % POLL_INTERVAL == 0 {
                if let Some(stop) = limits.stop_reason() {
                    return stop.outcome(attempts);
                }
            }
            let digest = template.digest(nonce);
            attempts += 1;
            if self.difficulty.is_met_by(&digest) {
                return MiningOutcome::Sealed(Seal {
                    nonce,
                    digest,
                    attempts,
                });
            }
            nonce = nonce.wrapping_add(1);
        }
    }

    fn seal_parallel(
        &self,
        template: &SealTemplate,
        start_nonce: u64,
        limits: &MiningLimits,
    ) -> MiningOutcome {
        let halt = AtomicBool::new(false);
        let total = AtomicU64::new(0);
        let winner: OnceLock<(u64, String)> = OnceLock::new();
        let stride = self.workers as u64;

        thread::scope(|scope| {
            for worker in 0..stride {
                let (halt, total, winner) = (&halt, &total, &winner);
                scope.spawn(move || {
                    let mut nonce = start_nonce.wrapping_add(worker);
                    let mut attempts = 0u64;
                    while !halt.load(Ordering::Relaxed) {
                        if attempts % POLL_INTERVAL == 0 && limits.stop_reason().is_some() {
                            halt.store(true, Ordering::Relaxed);
                            break;
                        }
                        let digest = template.digest(nonce);
                        attempts += 1;
                        if self.difficulty.is_met_by(&digest) {
                            let _ = winner.set((nonce, digest));
                            halt.store(true, Ordering::Relaxed);
                            break;
                        }
                        nonce = nonce.wrapping_add(stride);
                    }
                    total.fetch_add(attempts, Ordering::Relaxed);
                });
            }
        });

        let attempts = total.load(Ordering::Relaxed);
        match winner.into_inner() {
            Some((nonce, digest)) => MiningOutcome::Sealed(Seal {
                nonce,
                digest,
                attempts,
            }),
            None => limits
                .stop_reason()
                .unwrap_or(Stop::Cancelled)
                .outcome(attempts),
        }
    }
}
