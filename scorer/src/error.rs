use config::LoadConfigError;
use config::shared::ValidationError;
use telemetry::TracingError;
use thiserror::Error;

/// Result type for scorer operations.
pub type ScorerResult<T> = Result<T, ScorerError>;

/// Error type for the scorer service.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] TracingError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run failed: {0:#}")]
    Run(#[from] anyhow::Error),

    /// The run completed but some workers stopped before the pool was drained.
    #[error("{aborted} worker(s) stopped before the pool was drained")]
    WorkersAborted { aborted: usize },
}
