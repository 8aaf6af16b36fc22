use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, trace};

use crate::concurrency::shutdown::{ShutdownRx, is_shutdown_requested};
use crate::error::FanoutResult;
use crate::failpoints::{FETCH_ITEM, PROCESS_ITEM, WRITE_RESULT, fanout_fail_point};
use crate::fetcher::Fetcher;
use crate::pool::WorkPool;
use crate::processor::{Processor, ScoringModel, Tokenizer};
use crate::sink::ResultSink;
use crate::types::{FetchResult, ItemOutcome, ItemOutcomeType, ProcessedResult, WorkItem};
use crate::workers::base::{WorkerId, WorkerState, WorkerTally};
use crate::workers::pool::{WorkerHandle, WorkerPool};

/// Everything a worker shares with the other workers of a run.
///
/// Cloning is cheap: every field is a handle.
pub struct WorkerContext<F, T, M, K> {
    pub pool: WorkPool,
    pub fetcher: Arc<F>,
    pub processor: Arc<Processor<T, M>>,
    pub sink: Arc<K>,
    pub shutdown_rx: ShutdownRx,
}

impl<F, T, M, K> Clone for WorkerContext<F, T, M, K> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            fetcher: self.fetcher.clone(),
            processor: self.processor.clone(),
            sink: self.sink.clone(),
            shutdown_rx: self.shutdown_rx.clone(),
        }
    }
}

/// Worker running the claim-fetch-process-write loop until the pool is drained.
///
/// Fetch and process failures are contained: they are logged once with the item id and
/// counted, and the worker moves on. A sink failure or a corrupted pool stops the worker and is
/// returned from [`ScoringWorker::run`]; the other workers keep going.
pub struct ScoringWorker<F, T, M, K> {
    worker_id: WorkerId,
    context: WorkerContext<F, T, M, K>,
    state_tx: watch::Sender<WorkerState>,
    tally: Arc<WorkerTally>,
}

impl<F, T, M, K> ScoringWorker<F, T, M, K>
where
    F: Fetcher + Send + Sync + 'static,
    T: Tokenizer + Send + Sync + 'static,
    M: ScoringModel + Send + Sync + 'static,
    K: ResultSink + Send + Sync + 'static,
{
    pub fn new(worker_id: WorkerId, context: WorkerContext<F, T, M, K>) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::Idle);

        Self {
            worker_id,
            context,
            state_tx,
            tally: Arc::new(WorkerTally::new()),
        }
    }

    /// Spawns the worker into `pool` and returns immediately.
    pub fn spawn_into_pool(self, pool: &mut WorkerPool) {
        let worker_id = self.worker_id;
        let handle = WorkerHandle::new(self.state_tx.subscribe(), self.tally.clone());

        let span = tracing::info_span!("scoring_worker", worker_id = worker_id.0);
        pool.spawn(worker_id, handle, self.run().instrument(span));
    }

    /// Runs the loop until the pool is drained or shutdown is requested.
    ///
    /// Per-item counts go to the worker's [`WorkerTally`]. An error is returned only when the
    /// worker had to stop early.
    pub async fn run(self) -> FanoutResult<()> {
        info!("starting scoring worker");

        let result = self.run_loop().await;
        self.set_state(WorkerState::Done);

        let report = self.tally.report(self.worker_id, None);
        info!(
            processed = report.processed,
            absent = report.absent,
            failed = report.failed,
            aborted = result.is_err(),
            "scoring worker finished"
        );

        result
    }

    async fn run_loop(&self) -> FanoutResult<()> {
        loop {
            if is_shutdown_requested(&self.context.shutdown_rx) {
                info!("shutdown requested, stopping scoring worker");
                return Ok(());
            }

            self.set_state(WorkerState::Claiming);
            let item = match self.context.pool.claim() {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!("no items left to claim");
                    return Ok(());
                }
                Err(err) => {
                    error!(error = %err, "failed to claim work item, stopping scoring worker");
                    return Err(err);
                }
            };
            self.tally.claim();

            let outcome = self.fetch_and_process(item).await;
            let outcome_type = outcome.outcome_type();

            if let ItemOutcome::Processed(result) = outcome {
                self.set_state(WorkerState::Writing);

                if let Err(err) = self.write(result).await {
                    error!(
                        item_id = item.id(),
                        error = %err,
                        "failed to write result, stopping scoring worker"
                    );
                    self.tally.record(ItemOutcomeType::Failed);
                    return Err(err);
                }
            }

            trace!(item_id = item.id(), outcome = %outcome_type, "finished item");
            self.tally.record(outcome_type);
            self.set_state(WorkerState::Idle);
        }
    }

    /// Fetches and processes one item, turning every per-item failure into an outcome.
    async fn fetch_and_process(&self, item: WorkItem) -> ItemOutcome {
        self.set_state(WorkerState::Fetching);
        let fetched = match self.fetch(item).await {
            Ok(Some(fetched)) => fetched,
            Ok(None) => {
                debug!(item_id = item.id(), "item not found in source, skipping");
                return ItemOutcome::Absent;
            }
            Err(err) => {
                error!(item_id = item.id(), error = %err, "failed to fetch item");
                return ItemOutcome::Failed(err);
            }
        };

        self.set_state(WorkerState::Processing);
        match self.process(item, fetched) {
            Ok(result) => ItemOutcome::Processed(result),
            Err(err) => {
                error!(item_id = item.id(), error = %err, "failed to process item");
                ItemOutcome::Failed(err)
            }
        }
    }

    async fn fetch(&self, item: WorkItem) -> FanoutResult<Option<FetchResult>> {
        fanout_fail_point(FETCH_ITEM, item)?;

        self.context.fetcher.fetch(item).await
    }

    fn process(&self, item: WorkItem, fetched: FetchResult) -> FanoutResult<ProcessedResult> {
        fanout_fail_point(PROCESS_ITEM, item)?;

        self.context.processor.process(fetched)
    }

    async fn write(&self, result: ProcessedResult) -> FanoutResult<()> {
        fanout_fail_point(WRITE_RESULT, result.item())?;

        self.context.sink.append(result).await
    }

    fn set_state(&self, state: WorkerState) {
        self.state_tx.send_replace(state);
    }
}
