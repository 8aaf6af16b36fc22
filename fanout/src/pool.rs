use std::collections::VecDeque;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use rand::Rng;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::types::WorkItem;

#[derive(Debug)]
struct Inner {
    items: Mutex<VecDeque<WorkItem>>,
    initial_len: usize,
}

/// Bounded set of [`WorkItem`]s shared by all workers of a run.
///
/// The pool is populated once and then only drained: [`WorkPool::claim`] removes the item it
/// returns, so two callers can never observe the same item and nothing is ever put back.
/// Cloning the pool clones the handle, not the items.
#[derive(Debug, Clone)]
pub struct WorkPool {
    inner: Arc<Inner>,
}

impl WorkPool {
    /// Creates a pool holding `items` in the given order.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WorkItem>,
    {
        let items: VecDeque<WorkItem> = items.into_iter().map(Into::into).collect();
        let initial_len = items.len();

        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(items),
                initial_len,
            }),
        }
    }

    /// Creates a pool with every identifier of `range`.
    pub fn from_range(range: Range<i64>) -> Self {
        Self::new(range)
    }

    /// Creates a pool with `sample_size` distinct identifiers drawn uniformly from `range`.
    ///
    /// Fails when the range holds fewer identifiers than requested.
    pub fn sample<R: Rng + ?Sized>(
        range: Range<i64>,
        sample_size: usize,
        rng: &mut R,
    ) -> FanoutResult<Self> {
        let range_len = usize::try_from(range.end.saturating_sub(range.start)).unwrap_or(0);
        if sample_size > range_len {
            bail!(
                ErrorKind::ConfigError,
                "Sample larger than input range",
                format!("cannot sample {sample_size} identifiers from a range of {range_len}")
            );
        }

        if sample_size == 0 {
            return Ok(Self::new(Vec::<i64>::new()));
        }

        let items = rand::seq::index::sample(rng, range_len, sample_size)
            .into_iter()
            .map(|offset| WorkItem(range.start + offset as i64));

        Ok(Self::new(items))
    }

    /// Removes and returns the next item, or `Ok(None)` once the pool is drained.
    ///
    /// The lock is only held for the pop itself. An empty pool is the normal termination signal
    /// for a worker and not an error; an error is only returned if the pool lock was poisoned by
    /// a panicking holder, in which case its contents can no longer be trusted.
    pub fn claim(&self) -> FanoutResult<Option<WorkItem>> {
        let Ok(mut items) = self.inner.items.lock() else {
            bail!(
                ErrorKind::WorkPoolCorrupted,
                "Work pool lock poisoned",
                "a worker panicked while holding the work pool lock"
            );
        };

        let item = items.pop_front();
        if item.is_none() {
            debug!("work pool exhausted");
        }

        Ok(item)
    }

    /// Returns the number of items not yet claimed.
    pub fn remaining(&self) -> usize {
        match self.inner.items.lock() {
            Ok(items) => items.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns `true` if every item has been claimed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the number of items the pool was created with.
    pub fn initial_len(&self) -> usize {
        self.inner.initial_len
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn drain_concurrently(pool: &WorkPool, workers: usize) -> Vec<WorkItem> {
        let handles = (0..workers)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(item) = pool.claim().unwrap() {
                        claimed.push(item);
                    }
                    claimed
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    }

    #[test]
    fn claim_on_empty_pool_returns_none() {
        let pool = WorkPool::new(Vec::<i64>::new());

        assert_eq!(pool.claim().unwrap(), None);
        assert_eq!(pool.claim().unwrap(), None);
        assert!(pool.is_empty());
        assert_eq!(pool.initial_len(), 0);
    }

    #[test]
    fn claims_items_in_insertion_order_and_drains() {
        let pool = WorkPool::new([3_i64, 1, 2]);

        assert_eq!(pool.claim().unwrap(), Some(WorkItem(3)));
        assert_eq!(pool.remaining(), 2);
        assert_eq!(pool.claim().unwrap(), Some(WorkItem(1)));
        assert_eq!(pool.claim().unwrap(), Some(WorkItem(2)));
        assert_eq!(pool.claim().unwrap(), None);
        assert_eq!(pool.initial_len(), 3);
    }

    #[test]
    fn concurrent_claims_never_yield_duplicates() {
        for workers in [1, 2, 8] {
            for size in [0_i64, 1, 500] {
                let pool = WorkPool::from_range(0..size);
                let claimed = drain_concurrently(&pool, workers);

                let unique: HashSet<_> = claimed.iter().copied().collect();
                assert_eq!(claimed.len(), size as usize, "workers={workers} size={size}");
                assert_eq!(unique.len(), claimed.len(), "workers={workers} size={size}");
                assert!(pool.is_empty());
            }
        }
    }

    #[test]
    fn sample_draws_distinct_items_within_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = WorkPool::sample(100..200, 25, &mut rng).unwrap();

        let claimed = drain_concurrently(&pool, 2);
        let unique: HashSet<_> = claimed.iter().copied().collect();

        assert_eq!(claimed.len(), 25);
        assert_eq!(unique.len(), 25);
        assert!(claimed.iter().all(|item| (100..200).contains(&item.id())));
    }

    #[test]
    fn sample_larger_than_range_fails() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = WorkPool::sample(0..10, 11, &mut rng).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }
}
