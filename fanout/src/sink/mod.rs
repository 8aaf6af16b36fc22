//! Result sinks receiving scored items.

mod base;
pub mod csv;
pub mod memory;

pub use base::ResultSink;
