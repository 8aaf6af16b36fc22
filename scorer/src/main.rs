//! Scorer service binary.
//!
//! Loads the configuration, initializes tracing and runs a scoring pass over the configured
//! items, appending one `id,score` row per processed item to the result log.

use std::path::PathBuf;

use clap::Parser;
use config::load_config;
use config::shared::ScorerConfig;
use fanout::coordinator::RunSummary;
use tracing::{error, info};

use crate::core::start_scorer_with_config;
use crate::error::{ScorerError, ScorerResult};

mod core;
mod error;

/// Command line overrides applied on top of the loaded configuration.
#[derive(Debug, Parser)]
#[command(name = "scorer", version, about)]
struct AppArgs {
    /// Number of workers; `0` derives the count from the available cores
    #[arg(long)]
    workers: Option<u16>,

    /// Path of the CSV result log
    #[arg(long)]
    output: Option<PathBuf>,

    /// Seed making sampling and scores reproducible
    #[arg(long)]
    seed: Option<u64>,
}

impl AppArgs {
    fn apply(&self, scorer_config: &mut ScorerConfig) {
        if let Some(workers) = self.workers {
            scorer_config.workers.max_workers = Some(workers);
        }
        if let Some(output) = &self.output {
            scorer_config.sink.path = output.clone();
        }
    }
}

fn main() -> ScorerResult<()> {
    let args = AppArgs::parse();

    // Validated after the command line overrides are applied.
    let mut scorer_config = load_config::<ScorerConfig>()?;
    args.apply(&mut scorer_config);
    scorer_config.validate()?;

    let _log_flusher = init_tracing(&scorer_config)?;

    let summary = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(scorer_config, args.seed))?;

    print_summary(&summary);

    if !summary.is_clean() {
        return Err(ScorerError::WorkersAborted {
            aborted: summary.aborted_workers(),
        });
    }

    Ok(())
}

fn init_tracing(scorer_config: &ScorerConfig) -> ScorerResult<telemetry::LogFlusher> {
    let log_flusher = telemetry::init_tracing(env!("CARGO_BIN_NAME"), &scorer_config.log)?;

    Ok(log_flusher)
}

async fn async_main(scorer_config: ScorerConfig, seed: Option<u64>) -> ScorerResult<RunSummary> {
    match start_scorer_with_config(scorer_config, seed).await {
        Ok(summary) => {
            info!("scorer finished");
            Ok(summary)
        }
        Err(err) => {
            error!("{err:#}");
            Err(err.into())
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "processed: {}, absent: {}, failed: {}, unclaimed: {}, aborted workers: {}",
        summary.processed,
        summary.absent,
        summary.failed,
        summary.unclaimed,
        summary.aborted_workers()
    );

    if let Some(err) = summary.worker_error() {
        eprintln!("{err}");
    }
}
