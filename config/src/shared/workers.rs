use serde::Deserialize;

use crate::shared::ValidationError;

/// Sizing of the worker pool of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerPoolConfig {
    /// Fixed number of workers. When unset or `0` the count is derived from the host.
    #[serde(default)]
    pub max_workers: Option<u16>,
    /// Cores left free when deriving the worker count from the host.
    #[serde(default = "default_reserved_cores")]
    pub reserved_cores: u16,
}

impl WorkerPoolConfig {
    pub const DEFAULT_RESERVED_CORES: u16 = 1;

    /// Creates a configuration that runs exactly `workers` workers.
    pub fn fixed(workers: u16) -> Self {
        Self {
            max_workers: Some(workers),
            reserved_cores: Self::DEFAULT_RESERVED_CORES,
        }
    }

    /// Resolves the number of workers to spawn on a host with `available` cores.
    ///
    /// Never returns less than one.
    pub fn resolved_workers(&self, available: usize) -> u16 {
        match self.max_workers {
            Some(workers) if workers > 0 => workers,
            _ => {
                let available = u16::try_from(available).unwrap_or(u16::MAX);
                available.saturating_sub(self.reserved_cores).max(1)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            reserved_cores: default_reserved_cores(),
        }
    }
}

fn default_reserved_cores() -> u16 {
    WorkerPoolConfig::DEFAULT_RESERVED_CORES
}
