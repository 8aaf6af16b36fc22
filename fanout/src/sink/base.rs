use std::future::Future;

use crate::error::FanoutResult;
use crate::types::ProcessedResult;

/// Append-only destination for [`ProcessedResult`]s.
///
/// Every worker of a run appends to the same sink, so implementations must serialize access:
/// at most one append commits at a time and a record is committed either whole or not at all.
/// No ordering across workers is implied; records land in completion order.
///
/// An append error is treated as fatal for the worker that observed it, since it can no longer
/// guarantee that the items it processes are recorded.
pub trait ResultSink {
    /// Returns the name of the sink.
    fn name() -> &'static str;

    /// Appends one record.
    fn append(&self, result: ProcessedResult) -> impl Future<Output = FanoutResult<()>> + Send;

    /// Flushes and releases the sink once every worker is done.
    ///
    /// The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = FanoutResult<()>> + Send {
        async { Ok(()) }
    }
}
