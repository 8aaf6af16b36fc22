//! Process-wide tracing setup for the scorer and its tests.

use std::sync::Once;

use config::Environment;
use config::shared::LogConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable enabling log output in tests.
const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

/// Filter used by tests when `RUST_LOG` is unset.
const TEST_LOG_LEVEL: &str = "info";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors that can occur while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to install the log bridge: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] std::io::Error),

    #[error("invalid log filter `{directive}`: {source}")]
    Filter {
        directive: String,
        source: ParseError,
    },

    #[error("failed to create the log file appender: {0}")]
    FileAppender(#[from] rolling::InitError),

    #[error("a global subscriber is already installed: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Flushes buffered log lines to the log file when dropped.
///
/// Keep it alive for the whole run; dropping it early loses the lines still in flight.
#[must_use = "dropping the flusher stops writing to the log file"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the process-wide subscriber for `app_name`.
///
/// Events are filtered by `RUST_LOG` or, when unset, by [`LogConfig::level`]. They are written
/// to a daily rolling file named after `app_name` in [`LogConfig::directory`] and, in the dev
/// environment, mirrored to stdout. Records emitted through the `log` facade are forwarded too.
pub fn init_tracing(app_name: &str, log_config: &LogConfig) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;
    let filter = env_filter(&log_config.level)?;

    let file_appender = rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(app_name)
        .filename_suffix("log")
        .build(&log_config.directory)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);
    let stdout_layer = environment
        .is_dev()
        .then(|| fmt::layer().with_writer(std::io::stdout));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer);

    LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(LogFlusher { _guard: guard })
}

/// Installs a stdout subscriber for tests when `ENABLE_TRACING` is set.
///
/// Safe to call from every test; only the first call has an effect.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = env_filter(TEST_LOG_LEVEL).unwrap_or_else(|_| EnvFilter::new(TEST_LOG_LEVEL));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer());

        // Another subscriber may already be installed by the test harness.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
fn env_filter(default_directive: &str) -> Result<EnvFilter, TracingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(default_directive).map_err(|source| TracingError::Filter {
        directive: default_directive.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
    }

    #[test]
    fn accepts_per_target_directives() {
        assert!(env_filter("error,fanout=debug").is_ok());
    }
}
