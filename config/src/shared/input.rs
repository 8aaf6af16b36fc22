use serde::Deserialize;

use crate::shared::ValidationError;

/// Source of the item identifiers a run works through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputConfig {
    /// Identifiers in the half-open range `start..end`, optionally sampled without replacement.
    Range {
        start: i64,
        end: i64,
        #[serde(default)]
        sample_size: Option<usize>,
    },
    /// An explicit list of identifiers, processed as given.
    List { ids: Vec<i64> },
}

impl InputConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            InputConfig::Range {
                start,
                end,
                sample_size,
            } => {
                if start > end {
                    return Err(ValidationError::InvertedRange {
                        start: *start,
                        end: *end,
                    });
                }

                let available = end.abs_diff(*start);
                if let Some(sample_size) = sample_size
                    && *sample_size as u64 > available
                {
                    return Err(ValidationError::SampleTooLarge {
                        sample_size: *sample_size,
                        available,
                    });
                }

                Ok(())
            }
            InputConfig::List { .. } => Ok(()),
        }
    }

    /// Returns the number of items a run over this input starts with.
    pub fn len(&self) -> u64 {
        match self {
            InputConfig::Range {
                start,
                end,
                sample_size,
            } => match sample_size {
                Some(sample_size) => *sample_size as u64,
                None if start < end => end.abs_diff(*start),
                None => 0,
            },
            InputConfig::List { ids } => ids.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
