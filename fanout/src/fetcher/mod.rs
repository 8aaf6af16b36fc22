//! Fetch stage of the pipeline.

mod base;
pub mod sql;

pub use base::Fetcher;
pub use sql::{DEFAULT_LOOKUP_QUERY, SqlFetcher};
