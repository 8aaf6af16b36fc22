use std::collections::BTreeSet;
use std::time::Duration;

use config::shared::WorkerPoolConfig;
use fanout::coordinator::Coordinator;
use fanout::error::ErrorKind;
use fanout::fetcher::SqlFetcher;
use fanout::pool::WorkPool;
use fanout::error::FanoutResult;
use fanout::processor::{
    FixedScoreModel, LexiconScoreModel, Processor, ScoringModel, WhitespaceTokenizer,
};
use fanout::sink::memory::MemorySink;
use fanout::source::memory::MemoryStore;
use fanout::test_utils::fetcher::ScriptedFetcher;
use fanout::test_utils::sink::TestSinkWrapper;
use fanout::types::{ProcessedResult, WorkItem};
use telemetry::init_test_tracing;

fn fixed_processor(score: f64) -> Processor<WhitespaceTokenizer, FixedScoreModel> {
    Processor::new(WhitespaceTokenizer::new(), FixedScoreModel::new(score))
}

#[tokio::test(flavor = "multi_thread")]
async fn absent_items_are_skipped_and_present_items_are_logged() {
    init_test_tracing();

    let fetcher = ScriptedFetcher::new("a fine document").absent_if(|item| item.id() % 2 == 0);
    let sink = TestSinkWrapper::wrap(MemorySink::new());
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::new(1..=5_i64),
        fetcher,
        fixed_processor(0.75),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.absent, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.unclaimed, 0);
    assert!(summary.is_clean());
    assert!(sink.shutdown_called().await);

    let mut results = sink.results().await;
    results.sort_by_key(|result| result.item());
    assert_eq!(
        results,
        vec![
            ProcessedResult::new(WorkItem(1), 0.75),
            ProcessedResult::new(WorkItem(3), 0.75),
            ProcessedResult::new(WorkItem(5), 0.75),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn every_item_is_accounted_for_exactly_once() {
    init_test_tracing();

    for items in [0_i64, 1, 500] {
        for workers in [1_u16, 2, 8] {
            let fetcher = ScriptedFetcher::new("text")
                .absent_if(|item| item.id() % 3 == 0)
                .failing_if(|item| item.id() % 5 == 0);
            let sink = TestSinkWrapper::wrap(MemorySink::new());
            let coordinator = Coordinator::new(
                WorkerPoolConfig::fixed(workers),
                WorkPool::from_range(0..items),
                fetcher.clone(),
                fixed_processor(1.0),
                sink.clone(),
            );

            let summary = coordinator.run().await.unwrap();

            assert_eq!(summary.total(), items as u64, "{items} items, {workers} workers");
            assert_eq!(summary.unclaimed, 0);
            assert!(summary.is_clean());

            let mut fetched = fetcher.fetched_items();
            fetched.sort();
            let expected = (0..items).map(WorkItem).collect::<Vec<_>>();
            assert_eq!(fetched, expected, "{items} items, {workers} workers");

            let results = sink.results().await;
            let unique = results
                .iter()
                .map(|result| result.item())
                .collect::<BTreeSet<_>>();
            assert_eq!(results.len(), unique.len());
            assert_eq!(results.len() as u64, summary.processed);
            assert!(
                unique
                    .iter()
                    .all(|item| item.id() % 3 != 0 && item.id() % 5 != 0)
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sink_failure_stops_only_the_worker_that_observed_it() {
    init_test_tracing();

    let sink = TestSinkWrapper::wrap(MemorySink::new());
    sink.fail_for([3]).await;
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::new(1..=20_i64),
        ScriptedFetcher::new("text").with_latency(Duration::from_millis(1)),
        fixed_processor(0.5),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.aborted_workers(), 1);
    assert_eq!(summary.worker_errors[0].kind(), ErrorKind::SinkWriteFailed);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 19);
    assert_eq!(summary.unclaimed, 0);
    assert_eq!(summary.total(), 20);
    assert_eq!(sink.append_calls().await, 20);
    assert!(
        sink.results()
            .await
            .iter()
            .all(|result| result.item() != WorkItem(3))
    );
}

/// Model that panics when the scored text mentions item 10.
struct PanicOnTenModel;

impl ScoringModel for PanicOnTenModel {
    fn score(&self, tokens: &[String]) -> FanoutResult<f64> {
        if tokens.iter().any(|token| token == "10") {
            panic!("model cannot score item 10");
        }

        Ok(0.5)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_model_only_fails_its_item() {
    init_test_tracing();

    let store = MemoryStore::with_documents((1..=50_i64).map(|id| (id, format!("document {id}"))));
    let sink = MemorySink::new();
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::new(1..=50_i64),
        SqlFetcher::new(store.clone()),
        Processor::new(WhitespaceTokenizer::new(), PanicOnTenModel),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 49);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total(), 50);
    assert!(summary.is_clean());
    assert_eq!(store.open_connections(), 0);

    let results = sink.results().await;
    assert_eq!(results.len() as u64, summary.processed);
    assert!(results.iter().all(|result| result.item() != WorkItem(10)));
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_worker_keeps_run_accounting() {
    init_test_tracing();

    let sink = MemorySink::new();
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::new(1..=50_i64),
        ScriptedFetcher::new("text").panicking_ids([10]),
        fixed_processor(0.5),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 49);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unclaimed, 0);
    assert_eq!(summary.total(), 50);
    assert_eq!(summary.aborted_workers(), 1);
    assert_eq!(summary.worker_errors[0].kind(), ErrorKind::WorkerPanic);
    assert_eq!(sink.results().await.len() as u64, summary.processed);
}

#[tokio::test(flavor = "multi_thread")]
async fn items_stay_unclaimed_when_every_worker_aborts() {
    init_test_tracing();

    let sink = TestSinkWrapper::wrap(MemorySink::new());
    sink.fail_for([3]).await;
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(1),
        WorkPool::new(1..=20_i64),
        ScriptedFetcher::new("text"),
        fixed_processor(0.5),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unclaimed, 17);
    assert_eq!(summary.total(), 20);
    assert_eq!(
        summary.worker_error().map(|err| err.kind()),
        Some(ErrorKind::SinkWriteFailed)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_lets_items_in_flight_finish() {
    init_test_tracing();

    let sink = TestSinkWrapper::wrap(MemorySink::new());
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::from_range(0..1000),
        ScriptedFetcher::new("text").with_latency(Duration::from_millis(2)),
        fixed_processor(0.5),
        sink.clone(),
    );
    let shutdown_tx = coordinator.shutdown_tx();
    let results_notify = sink.wait_for_results(10).await;

    let run = tokio::spawn(coordinator.run());
    results_notify.notified().await;
    shutdown_tx.shutdown().unwrap();

    let summary = run.await.unwrap().unwrap();

    assert!(summary.unclaimed > 0);
    assert_eq!(summary.total(), 1000);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.processed, sink.results().await.len() as u64);
    assert!(summary.is_clean());
}

#[tokio::test(flavor = "multi_thread")]
async fn every_connection_is_released() {
    init_test_tracing();

    let store = MemoryStore::new();
    for id in 0..100 {
        store.insert(id, format!("document {id}")).await;
    }
    store.fail_queries_for(13).await;
    store.fail_queries_for(42).await;
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(8),
        WorkPool::from_range(0..120),
        SqlFetcher::new(store.clone()),
        Processor::new(
            WhitespaceTokenizer::new(),
            LexiconScoreModel::new([("document", 1.0)]),
        ),
        MemorySink::new(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 98);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.absent, 20);
    assert_eq!(store.open_connections(), 0);
    assert_eq!(store.total_connections(), 120);
}
