use config::shared::WorkerPoolConfig;
use fail::FailScenario;
use fanout::coordinator::{Coordinator, RunSummary};
use fanout::error::ErrorKind;
use fanout::failpoints::{FETCH_ITEM, PROCESS_ITEM, WRITE_RESULT};
use fanout::pool::WorkPool;
use fanout::processor::{FixedScoreModel, Processor, WhitespaceTokenizer};
use fanout::sink::memory::MemorySink;
use fanout::test_utils::fetcher::ScriptedFetcher;
use fanout::types::WorkItem;
use telemetry::init_test_tracing;

async fn run(workers: u16, items: i64, sink: MemorySink) -> RunSummary {
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(workers),
        WorkPool::new(1..=items),
        ScriptedFetcher::new("text"),
        Processor::new(WhitespaceTokenizer::new(), FixedScoreModel::new(0.5)),
        sink,
    );

    coordinator.run().await.unwrap()
}

async fn stored_items(sink: &MemorySink) -> Vec<WorkItem> {
    let mut items = sink
        .results()
        .await
        .iter()
        .map(|result| result.item())
        .collect::<Vec<_>>();
    items.sort();
    items
}

#[tokio::test(flavor = "multi_thread")]
async fn injected_fetch_failure_only_fails_the_targeted_item() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(FETCH_ITEM, "return(3)").unwrap();

    let sink = MemorySink::new();
    let summary = run(2, 5, sink.clone()).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 4);
    assert!(summary.is_clean());
    assert_eq!(
        stored_items(&sink).await,
        vec![WorkItem(1), WorkItem(2), WorkItem(4), WorkItem(5)]
    );

    scenario.teardown();
}

#[tokio::test(flavor = "multi_thread")]
async fn injected_process_failures_are_contained() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(PROCESS_ITEM, "return(2;4)").unwrap();

    let sink = MemorySink::new();
    let summary = run(3, 6, sink.clone()).await;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.processed, 4);
    assert_eq!(
        stored_items(&sink).await,
        vec![WorkItem(1), WorkItem(3), WorkItem(5), WorkItem(6)]
    );

    scenario.teardown();
}

#[tokio::test(flavor = "multi_thread")]
async fn failpoint_without_argument_fails_every_item() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(FETCH_ITEM, "return").unwrap();

    let sink = MemorySink::new();
    let summary = run(4, 40, sink.clone()).await;

    assert_eq!(summary.failed, 40);
    assert_eq!(summary.processed, 0);
    assert!(summary.is_clean());
    assert!(sink.results().await.is_empty());

    scenario.teardown();
}

#[tokio::test(flavor = "multi_thread")]
async fn injected_write_failure_aborts_the_worker() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(WRITE_RESULT, "return(5)").unwrap();

    let sink = MemorySink::new();
    let summary = run(1, 10, sink.clone()).await;

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unclaimed, 5);
    assert_eq!(summary.aborted_workers(), 1);
    assert_eq!(summary.worker_errors[0].kind(), ErrorKind::InjectedFailure);

    scenario.teardown();
}
