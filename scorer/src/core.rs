use config::shared::{InputConfig, ScorerConfig};
use fanout::coordinator::{Coordinator, RunSummary};
use fanout::error::FanoutResult;
use fanout::fetcher::{Fetcher, SqlFetcher};
use fanout::pool::WorkPool;
use fanout::processor::{Processor, RandomScoreModel, ScoringModel, Tokenizer, WhitespaceTokenizer};
use fanout::sink::ResultSink;
use fanout::sink::csv::CsvFileSink;
use fanout::source::postgres::PostgresStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

/// Starts a scoring run with the provided configuration and waits for it to finish.
///
/// Items are fetched from the configured Postgres database, scored with a random model and
/// appended to the CSV result log. When `seed` is set, sampling and scores are reproducible.
pub async fn start_scorer_with_config(
    scorer_config: ScorerConfig,
    seed: Option<u64>,
) -> anyhow::Result<RunSummary> {
    info!("starting scorer service");

    log_config(&scorer_config);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let pool = build_work_pool(&scorer_config.input, &mut rng)?;

    let store = PostgresStore::new(&scorer_config.source);
    let fetcher = SqlFetcher::with_query(store, scorer_config.query.lookup.clone());

    let model = match seed {
        Some(seed) => RandomScoreModel::with_seed(seed),
        None => RandomScoreModel::new(),
    };
    let processor = Processor::new(WhitespaceTokenizer::new(), model);

    let sink = CsvFileSink::open(&scorer_config.sink.path).await?;

    let coordinator = Coordinator::new(scorer_config.workers, pool, fetcher, processor, sink);
    let summary = run_coordinator(coordinator).await?;

    Ok(summary)
}

/// Builds the work pool described by `input`.
pub fn build_work_pool<R>(input: &InputConfig, rng: &mut R) -> FanoutResult<WorkPool>
where
    R: Rng + ?Sized,
{
    match input {
        InputConfig::Range {
            start,
            end,
            sample_size: Some(sample_size),
        } => WorkPool::sample(*start..*end, *sample_size, rng),
        InputConfig::Range {
            start,
            end,
            sample_size: None,
        } => Ok(WorkPool::from_range(*start..*end)),
        InputConfig::List { ids } => Ok(WorkPool::new(ids.iter().copied())),
    }
}

fn log_config(config: &ScorerConfig) {
    debug!(
        host = config.source.host,
        port = config.source.port,
        database = config.source.name,
        tls = config.source.tls.enabled,
        "using postgres source config"
    );
    debug!(query = config.query.lookup, "using lookup query");
    debug!(items = config.input.len(), input = ?config.input, "using input config");
    debug!(
        max_workers = ?config.workers.max_workers,
        reserved_cores = config.workers.reserved_cores,
        "using worker pool config"
    );
    debug!(path = %config.sink.path.display(), "using csv sink config");
}

/// Runs the coordinator until the pool is drained or Ctrl+C is received.
///
/// On Ctrl+C the workers finish the items in flight and stop; the rest stays unclaimed.
async fn run_coordinator<F, T, M, K>(
    coordinator: Coordinator<F, T, M, K>,
) -> anyhow::Result<RunSummary>
where
    F: Fetcher + Send + Sync + 'static,
    T: Tokenizer + Send + Sync + 'static,
    M: ScoringModel + Send + Sync + 'static,
    K: ResultSink + Send + Sync + 'static,
{
    let shutdown_tx = coordinator.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl+c, run cannot be interrupted");
            return;
        }

        info!("sigint (ctrl+c) received, finishing items in flight");

        if let Err(err) = shutdown_tx.shutdown() {
            warn!(error = ?err, "failed to send shutdown signal");
        }
    });

    let result = coordinator.run().await;

    // The run may finish without Ctrl+C, in which case the listener is still waiting.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    Ok(result?)
}
