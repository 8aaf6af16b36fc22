use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::FanoutResult;
use crate::sink::ResultSink;
use crate::types::ProcessedResult;

/// In-memory [`ResultSink`] for tests and dry runs.
///
/// All records are held in memory and lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    results: Arc<Mutex<Vec<ProcessedResult>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all records in append order.
    pub async fn results(&self) -> Vec<ProcessedResult> {
        let results = self.results.lock().await;
        results.clone()
    }
}

impl ResultSink for MemorySink {
    fn name() -> &'static str {
        "memory"
    }

    async fn append(&self, result: ProcessedResult) -> FanoutResult<()> {
        let mut results = self.results.lock().await;

        debug!(item_id = result.item().id(), score = result.score(), "appending result");
        results.push(result);

        Ok(())
    }
}
