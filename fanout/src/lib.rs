//! Bounded, fixed-size fan-out of fetch-and-score work.
//!
//! A [`coordinator::Coordinator`] runs a fixed number of workers over a shared
//! [`pool::WorkPool`]. Each worker repeatedly claims an item, fetches its text through a
//! [`fetcher::Fetcher`], scores it with a [`processor::Processor`] and appends the result to a
//! [`sink::ResultSink`] until the pool is drained.
//!
//! Per-item failures are logged once and counted without stopping the worker; a failing sink
//! stops the worker that observed it while the others keep going.

pub mod concurrency;
pub mod coordinator;
pub mod error;
pub mod failpoints;
pub mod fetcher;
mod macros;
pub mod pool;
pub mod processor;
pub mod sink;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
