use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::sink::ResultSink;
use crate::test_utils::notify::TimedNotify;
use crate::types::ProcessedResult;

#[derive(Debug)]
struct Inner<K> {
    wrapped_sink: K,
    results: Vec<ProcessedResult>,
    failing_ids: HashSet<i64>,
    conditions: Vec<(usize, Arc<Notify>)>,
    append_calls: u64,
    shutdown_called: bool,
}

impl<K> Inner<K> {
    fn check_conditions(&mut self) {
        let count = self.results.len();
        self.conditions.retain(|(expected, notify)| {
            let reached = count >= *expected;
            if reached {
                notify.notify_one();
            }
            !reached
        });
    }
}

/// Test wrapper for [`ResultSink`] implementations that records every append.
///
/// Appends for ids registered with [`TestSinkWrapper::fail_for`] fail with
/// [`ErrorKind::SinkWriteFailed`] without reaching the wrapped sink.
#[derive(Debug, Clone)]
pub struct TestSinkWrapper<K> {
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K> TestSinkWrapper<K> {
    pub fn wrap(sink: K) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                wrapped_sink: sink,
                results: Vec::new(),
                failing_ids: HashSet::new(),
                conditions: Vec::new(),
                append_calls: 0,
                shutdown_called: false,
            })),
        }
    }

    /// Makes appends of `ids` fail.
    pub async fn fail_for(&self, ids: impl IntoIterator<Item = i64>) {
        let mut inner = self.inner.lock().await;
        inner.failing_ids.extend(ids);
    }

    /// Returns every successfully appended record in append order.
    pub async fn results(&self) -> Vec<ProcessedResult> {
        self.inner.lock().await.results.clone()
    }

    /// Returns the number of appends attempted, including failed ones.
    pub async fn append_calls(&self) -> u64 {
        self.inner.lock().await.append_calls
    }

    pub async fn shutdown_called(&self) -> bool {
        self.inner.lock().await.shutdown_called
    }

    /// Returns a notification fired once at least `count` records were appended.
    pub async fn wait_for_results(&self, count: usize) -> TimedNotify {
        let notify = Arc::new(Notify::new());
        let mut inner = self.inner.lock().await;
        inner.conditions.push((count, notify.clone()));
        inner.check_conditions();

        TimedNotify::new(notify)
    }
}

impl<K> ResultSink for TestSinkWrapper<K>
where
    K: ResultSink + Send + Sync,
{
    fn name() -> &'static str {
        K::name()
    }

    async fn append(&self, result: ProcessedResult) -> FanoutResult<()> {
        let mut inner = self.inner.lock().await;
        inner.append_calls += 1;

        if inner.failing_ids.contains(&result.item().id()) {
            bail!(
                ErrorKind::SinkWriteFailed,
                "Scripted sink failure",
                format!("appending item {} is scripted to fail", result.item())
            );
        }

        inner.wrapped_sink.append(result).await?;
        inner.results.push(result);
        inner.check_conditions();

        Ok(())
    }

    async fn shutdown(&self) -> FanoutResult<()> {
        let mut inner = self.inner.lock().await;
        inner.shutdown_called = true;
        inner.wrapped_sink.shutdown().await
    }
}
