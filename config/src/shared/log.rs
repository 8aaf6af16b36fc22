use std::path::PathBuf;

use serde::Deserialize;

/// Settings of the process-wide log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_level")]
    pub level: String,
    /// Directory the rolling log files are written to.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl LogConfig {
    pub const DEFAULT_LEVEL: &'static str = "error";

    pub const DEFAULT_DIRECTORY: &'static str = "logs";
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_directory(),
        }
    }
}

fn default_level() -> String {
    LogConfig::DEFAULT_LEVEL.to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(LogConfig::DEFAULT_DIRECTORY)
}
