use std::path::PathBuf;

use serde::Deserialize;

use crate::shared::ValidationError;

/// Location of the result log.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SinkConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl SinkConfig {
    pub const DEFAULT_PATH: &'static str = "results.csv";

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "sink.path".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from(SinkConfig::DEFAULT_PATH)
}
