use serde::Deserialize;

use crate::shared::ValidationError;

/// Lookup query run once per item against the source database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueryConfig {
    /// Single-parameter query; `$1` is bound to the item identifier and the first column of the
    /// first row is the text to score.
    #[serde(default = "default_lookup")]
    pub lookup: String,
}

impl QueryConfig {
    pub const DEFAULT_LOOKUP: &'static str = "select text from documents where id = $1";

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.lookup.contains("$1") {
            return Err(ValidationError::MissingQueryParameter(self.lookup.clone()));
        }

        Ok(())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            lookup: default_lookup(),
        }
    }
}

fn default_lookup() -> String {
    QueryConfig::DEFAULT_LOOKUP.to_string()
}
