use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{ErrorKind, FanoutResult};
use crate::fanout_error;
use crate::workers::base::{WorkerId, WorkerReport, WorkerState, WorkerTally};

/// Handle to a worker spawned into a [`WorkerPool`].
#[derive(Debug)]
pub struct WorkerHandle {
    state_rx: watch::Receiver<WorkerState>,
    tally: Arc<WorkerTally>,
}

impl WorkerHandle {
    pub fn new(state_rx: watch::Receiver<WorkerState>, tally: Arc<WorkerTally>) -> Self {
        Self { state_rx, tally }
    }

    /// Returns the last state the worker published.
    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }
}

/// Set of workers running concurrently on the tokio runtime.
///
/// [`WorkerPool`] owns the spawned tasks and the [`WorkerTally`] of each worker, and joins them
/// all in [`WorkerPool::wait_all`]. A worker that panics does not take the others down: its
/// report is rebuilt from its tally and carries an [`ErrorKind::WorkerPanic`] error.
#[derive(Debug, Default)]
pub struct WorkerPool {
    active: BTreeMap<WorkerId, WorkerHandle>,
    join_set: JoinSet<(WorkerId, FanoutResult<()>)>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker future into the pool.
    ///
    /// If a worker with the same id is already running, logs a warning and skips the spawn.
    pub fn spawn<F>(&mut self, worker_id: WorkerId, handle: WorkerHandle, future: F)
    where
        F: Future<Output = FanoutResult<()>> + Send + 'static,
    {
        if self.active.contains_key(&worker_id) {
            warn!(%worker_id, "worker already exists in pool");
            return;
        }

        self.join_set.spawn(async move {
            let result = future.await;
            (worker_id, result)
        });
        self.active.insert(worker_id, handle);

        debug!(%worker_id, "spawned worker in pool");
    }

    /// Waits for every worker to finish and returns their reports, ordered by worker id.
    pub async fn wait_all(mut self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.active.len());
        let mut panics = Vec::new();

        while let Some(joined) = self.join_set.join_next().await {
            match joined {
                Ok((worker_id, result)) => {
                    let Some(handle) = self.active.remove(&worker_id) else {
                        continue;
                    };

                    if let Err(err) = &result {
                        error!(%worker_id, error = %err, "worker completed with error");
                    } else {
                        debug!(%worker_id, "worker completed");
                    }
                    reports.push(handle.tally.report(worker_id, result.err()));
                }
                Err(join_err) => {
                    error!(error = %join_err, "worker panicked");
                    panics.push(join_err);
                }
            }
        }

        // Workers left in the map never returned, so each of them owns one of the panics.
        let mut panics = panics.into_iter();
        for (worker_id, handle) in std::mem::take(&mut self.active) {
            let state = handle.state();
            error!(%worker_id, %state, "worker stopped without a report");

            let err = match panics.next() {
                Some(join_err) => fanout_error!(
                    ErrorKind::WorkerPanic,
                    "Scoring worker panicked",
                    format!("worker {worker_id} panicked while {state}"),
                    source: join_err
                ),
                None => fanout_error!(
                    ErrorKind::WorkerPanic,
                    "Scoring worker stopped without a report",
                    format!("worker {worker_id} stopped while {state}")
                ),
            };
            reports.push(handle.tally.report(worker_id, Some(err)));
        }

        reports.sort_by_key(|report| report.worker_id);

        reports
    }
}
