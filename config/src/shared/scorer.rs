use serde::Deserialize;

use crate::Config;
use crate::shared::{
    InputConfig, LogConfig, PgConnectionConfig, QueryConfig, SinkConfig, ValidationError,
    WorkerPoolConfig,
};

/// Complete configuration of the scorer service.
///
/// This intentionally does not implement `Serialize` to avoid leaking the source password.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerConfig {
    /// Database the item texts are fetched from.
    pub source: PgConnectionConfig,
    #[serde(default)]
    pub query: QueryConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub workers: WorkerPoolConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.query.validate()?;
        self.input.validate()?;
        self.workers.validate()?;
        self.sink.validate()
    }
}

impl Config for ScorerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["input.ids"];
}
