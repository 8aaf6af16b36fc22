//! Worker implementations running the claim-fetch-process-write loop.

pub mod base;
pub mod pool;
pub mod scoring;

pub use base::{WorkerId, WorkerReport, WorkerState, WorkerTally};
pub use pool::{WorkerHandle, WorkerPool};
pub use scoring::{ScoringWorker, WorkerContext};
