use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FanoutError;
use crate::types::ItemOutcomeType;

/// Identifier of a worker within a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u16);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of the claim-fetch-process-write loop a worker is in.
///
/// A worker cycles `Idle → Claiming → Fetching → Processing → Writing → Idle`. Absent and failed
/// items skip the later phases and go straight back to `Idle`. The worker ends in `Done` once a
/// claim finds the pool empty, shutdown is requested, or it aborts on a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Claiming,
    Fetching,
    Processing,
    Writing,
    Done,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Claiming => write!(f, "claiming"),
            WorkerState::Fetching => write!(f, "fetching"),
            WorkerState::Processing => write!(f, "processing"),
            WorkerState::Writing => write!(f, "writing"),
            WorkerState::Done => write!(f, "done"),
        }
    }
}

/// Counters a worker updates while it runs.
///
/// The tally is shared between the worker task and the [`WorkerPool`], so the counts survive a
/// worker that panics.
///
/// [`WorkerPool`]: crate::workers::pool::WorkerPool
#[derive(Debug, Default)]
pub struct WorkerTally {
    claimed: AtomicU64,
    processed: AtomicU64,
    absent: AtomicU64,
    failed: AtomicU64,
}

impl WorkerTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts an item taken from the work pool.
    pub fn claim(&self) {
        self.claimed.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a claimed item as finished.
    pub fn record(&self, outcome: ItemOutcomeType) {
        let counter = match outcome {
            ItemOutcomeType::Processed => &self.processed,
            ItemOutcomeType::Absent => &self.absent,
            ItemOutcomeType::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds the final report of the worker.
    ///
    /// An item claimed but never finished was lost with the worker and is counted as failed.
    pub fn report(&self, worker_id: WorkerId, error: Option<FanoutError>) -> WorkerReport {
        let claimed = self.claimed.load(Ordering::Relaxed);
        let processed = self.processed.load(Ordering::Relaxed);
        let absent = self.absent.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let in_flight = claimed.saturating_sub(processed + absent + failed);

        WorkerReport {
            worker_id,
            processed,
            absent,
            failed: failed + in_flight,
            error,
        }
    }
}

/// Tally of what a single worker did over its lifetime.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub processed: u64,
    pub absent: u64,
    pub failed: u64,
    /// Fatal error or panic that stopped the worker before the pool was drained, if any.
    pub error: Option<FanoutError>,
}

impl WorkerReport {
    /// Returns `true` if the worker stopped because of a fatal error.
    pub fn aborted(&self) -> bool {
        self.error.is_some()
    }
}
