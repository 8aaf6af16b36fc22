use tracing::{debug, warn};

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::fetcher::Fetcher;
use crate::source::{Connection, DataStore, Row, Value};
use crate::types::{FetchResult, WorkItem};

/// Default lookup query used by [`SqlFetcher`].
pub const DEFAULT_LOOKUP_QUERY: &str = "select text from documents where id = $1";

/// [`Fetcher`] running a single-parameter lookup query against a [`DataStore`].
///
/// A connection is opened for every fetch and closed before the fetch returns, whatever the
/// outcome of the query. The item id is bound as the only parameter. No row means the item is
/// absent; otherwise the first column of the first row must hold the text.
#[derive(Debug, Clone)]
pub struct SqlFetcher<S> {
    store: S,
    query: String,
}

impl<S> SqlFetcher<S>
where
    S: DataStore,
{
    /// Creates a fetcher using [`DEFAULT_LOOKUP_QUERY`].
    pub fn new(store: S) -> Self {
        Self::with_query(store, DEFAULT_LOOKUP_QUERY)
    }

    /// Creates a fetcher with a custom lookup query.
    pub fn with_query(store: S, query: impl Into<String>) -> Self {
        Self {
            store,
            query: query.into(),
        }
    }
}

impl<S> Fetcher for SqlFetcher<S>
where
    S: DataStore,
{
    async fn fetch(&self, item: WorkItem) -> FanoutResult<Option<FetchResult>> {
        let mut connection = self.store.connect().await?;

        let rows = connection
            .execute(&self.query, &[Value::Int(item.id())])
            .await;

        // The rows, if any, are already in memory so a failed close does not fail the item.
        if let Err(err) = connection.close().await {
            warn!(
                item_id = item.id(),
                store = S::name(),
                error = %err,
                "failed to close connection"
            );
        }

        let rows = rows?;
        if rows.len() > 1 {
            debug!(
                item_id = item.id(),
                rows = rows.len(),
                "lookup returned more than one row, using the first"
            );
        }

        match rows.into_iter().next() {
            Some(row) => extract_text(item, row).map(Some),
            None => Ok(None),
        }
    }
}

fn extract_text(item: WorkItem, row: Row) -> FanoutResult<FetchResult> {
    match row.into_values().into_iter().next() {
        Some(Value::Text(text)) => Ok(FetchResult::new(item, text)),
        Some(Value::Null) => bail!(
            ErrorKind::InvalidData,
            "Fetched text is null",
            format!("the lookup for item {item} returned a null text column")
        ),
        Some(other) => bail!(
            ErrorKind::InvalidData,
            "Fetched value is not text",
            format!("the lookup for item {item} returned `{other}` instead of text")
        ),
        None => bail!(
            ErrorKind::InvalidData,
            "Fetched row has no columns",
            format!("the lookup for item {item} returned an empty row")
        ),
    }
}
