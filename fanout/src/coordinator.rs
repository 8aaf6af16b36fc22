use std::sync::Arc;
use std::thread::available_parallelism;

use config::shared::WorkerPoolConfig;
use tracing::{error, info, warn};

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::error::{FanoutError, FanoutResult};
use crate::fetcher::Fetcher;
use crate::pool::WorkPool;
use crate::processor::{Processor, ScoringModel, Tokenizer};
use crate::sink::ResultSink;
use crate::workers::base::WorkerId;
use crate::workers::pool::WorkerPool;
use crate::workers::scoring::{ScoringWorker, WorkerContext};

/// Aggregated outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Number of workers spawned.
    pub workers: u16,
    pub processed: u64,
    pub absent: u64,
    pub failed: u64,
    /// Items still in the pool when every worker stopped.
    pub unclaimed: u64,
    /// Errors that stopped a worker, one per aborted or panicked worker.
    pub worker_errors: Vec<FanoutError>,
}

impl RunSummary {
    /// Returns the number of items accounted for, which equals the initial pool size.
    pub fn total(&self) -> u64 {
        self.processed + self.absent + self.failed + self.unclaimed
    }

    /// Returns the number of workers that stopped before the pool was drained.
    pub fn aborted_workers(&self) -> usize {
        self.worker_errors.len()
    }

    /// Returns `true` if every worker ran until the pool was drained or shutdown was requested.
    pub fn is_clean(&self) -> bool {
        self.worker_errors.is_empty()
    }

    /// Returns all worker errors aggregated into a single error, if any.
    pub fn worker_error(&self) -> Option<FanoutError> {
        match self.worker_errors.as_slice() {
            [] => None,
            [err] => Some(err.clone()),
            errors => Some(errors.to_vec().into()),
        }
    }
}

/// Runs a fixed set of workers over a [`WorkPool`] until it is drained.
///
/// The coordinator owns the pool, the fetcher, the processor and the sink for the duration of
/// the run and hands every worker a shared handle to each of them.
#[derive(Debug)]
pub struct Coordinator<F, T, M, K> {
    config: WorkerPoolConfig,
    pool: WorkPool,
    fetcher: Arc<F>,
    processor: Arc<Processor<T, M>>,
    sink: Arc<K>,
    shutdown_tx: ShutdownTx,
    shutdown_rx: ShutdownRx,
}

impl<F, T, M, K> Coordinator<F, T, M, K>
where
    F: Fetcher + Send + Sync + 'static,
    T: Tokenizer + Send + Sync + 'static,
    M: ScoringModel + Send + Sync + 'static,
    K: ResultSink + Send + Sync + 'static,
{
    pub fn new(
        config: WorkerPoolConfig,
        pool: WorkPool,
        fetcher: F,
        processor: Processor<T, M>,
        sink: K,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

        Self {
            config,
            pool,
            fetcher: Arc::new(fetcher),
            processor: Arc::new(processor),
            sink: Arc::new(sink),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Returns a handle that stops the run once the items in flight are written.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns the number of workers [`Coordinator::run`] spawns on this host.
    pub fn worker_count(&self) -> u16 {
        let available = available_parallelism().map(|n| n.get()).unwrap_or(1);
        self.config.resolved_workers(available)
    }

    /// Spawns the workers, waits for all of them and shuts the sink down.
    ///
    /// Failures of individual workers do not fail the run; they are collected in
    /// [`RunSummary::worker_errors`]. An error is returned only if the sink fails to shut down.
    pub async fn run(self) -> FanoutResult<RunSummary> {
        let workers = self.worker_count();
        let initial_len = self.pool.initial_len();

        info!(
            workers,
            items = initial_len,
            sink = K::name(),
            "starting run"
        );

        let context = WorkerContext {
            pool: self.pool.clone(),
            fetcher: self.fetcher.clone(),
            processor: self.processor.clone(),
            sink: self.sink.clone(),
            shutdown_rx: self.shutdown_rx.clone(),
        };

        let mut worker_pool = WorkerPool::new();
        for id in 0..workers {
            ScoringWorker::new(WorkerId(id), context.clone()).spawn_into_pool(&mut worker_pool);
        }
        drop(context);

        let reports = worker_pool.wait_all().await;

        let mut summary = RunSummary {
            workers,
            unclaimed: self.pool.remaining() as u64,
            ..RunSummary::default()
        };
        for report in reports {
            summary.processed += report.processed;
            summary.absent += report.absent;
            summary.failed += report.failed;

            if let Some(err) = report.error {
                summary.worker_errors.push(err);
            }
        }

        if summary.unclaimed > 0 {
            warn!(unclaimed = summary.unclaimed, "run stopped before the pool was drained");
        }
        if !summary.is_clean() {
            error!(
                aborted_workers = summary.aborted_workers(),
                "some workers stopped because of an error"
            );
        }

        self.sink.shutdown().await?;

        info!(
            processed = summary.processed,
            absent = summary.absent,
            failed = summary.failed,
            unclaimed = summary.unclaimed,
            aborted_workers = summary.aborted_workers(),
            "run finished"
        );

        Ok(summary)
    }
}
