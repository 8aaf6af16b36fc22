use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::fetcher::Fetcher;
use crate::types::{FetchResult, WorkItem};

type ItemPredicate = Arc<dyn Fn(WorkItem) -> bool + Send + Sync>;

/// [`Fetcher`] whose answer for each item is decided by the test.
///
/// By default every item is found with the same text. Items can be made absent by predicate,
/// failing by id or predicate, and chosen ids can make the fetch panic. Every call is recorded,
/// so tests can check that each item was fetched exactly once.
#[derive(Clone)]
pub struct ScriptedFetcher {
    text: String,
    absent: ItemPredicate,
    failing: ItemPredicate,
    panicking: HashSet<i64>,
    latency: Option<Duration>,
    fetched: Arc<Mutex<Vec<WorkItem>>>,
}

impl ScriptedFetcher {
    /// Creates a fetcher that finds every item with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            absent: Arc::new(|_| false),
            failing: Arc::new(|_| false),
            panicking: HashSet::new(),
            latency: None,
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn absent_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(WorkItem) -> bool + Send + Sync + 'static,
    {
        self.absent = Arc::new(predicate);
        self
    }

    pub fn failing_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(WorkItem) -> bool + Send + Sync + 'static,
    {
        self.failing = Arc::new(predicate);
        self
    }

    pub fn failing_ids(self, ids: impl IntoIterator<Item = i64>) -> Self {
        let ids: HashSet<i64> = ids.into_iter().collect();
        self.failing_if(move |item| ids.contains(&item.id()))
    }

    /// Makes the fetch of each of `ids` panic, taking the calling worker down.
    pub fn panicking_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.panicking = ids.into_iter().collect();
        self
    }

    /// Makes every fetch wait for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns every item fetched so far, in call order.
    pub fn fetched_items(&self) -> Vec<WorkItem> {
        self.fetched
            .lock()
            .map(|fetched| fetched.clone())
            .unwrap_or_default()
    }
}

impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, item: WorkItem) -> FanoutResult<Option<FetchResult>> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(item);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.panicking.contains(&item.id()) {
            panic!("scripted panic while fetching item {item}");
        }

        if (self.failing)(item) {
            bail!(
                ErrorKind::FetchFailed,
                "Scripted fetch failure",
                format!("item {item} is scripted to fail")
            );
        }

        if (self.absent)(item) {
            return Ok(None);
        }

        Ok(Some(FetchResult::new(item, self.text.clone())))
    }
}
