use std::future::Future;

use crate::error::FanoutResult;
use crate::types::{FetchResult, WorkItem};

/// Retrieves the data associated with a [`WorkItem`].
///
/// A missing record is a normal outcome reported as `Ok(None)`, not an error. Errors are
/// reserved for I/O, connectivity, and malformed data; the worker logs them and moves on to the
/// next item. Implementations must be safe to call from many workers at once.
pub trait Fetcher {
    /// Fetches the data for `item`.
    fn fetch(
        &self,
        item: WorkItem,
    ) -> impl Future<Output = FanoutResult<Option<FetchResult>>> + Send;
}
