use config::shared::WorkerPoolConfig;
use fanout::coordinator::Coordinator;
use fanout::pool::WorkPool;
use fanout::processor::{FixedScoreModel, Processor, WhitespaceTokenizer};
use fanout::sink::csv::{CsvFileSink, read_result_log};
use fanout::test_utils::fetcher::ScriptedFetcher;
use fanout::types::WorkItem;
use telemetry::init_test_tracing;

async fn run_into(path: &std::path::Path) {
    let sink = CsvFileSink::open(path).await.unwrap();
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(2),
        WorkPool::new(1..=5_i64),
        ScriptedFetcher::new("text").absent_if(|item| item.id() % 2 == 0),
        Processor::new(WhitespaceTokenizer::new(), FixedScoreModel::new(0.25)),
        sink,
    );

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.processed, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn result_log_holds_one_row_per_processed_item() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    run_into(&path).await;

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(contents.starts_with("id,score\n"));

    let mut items = read_result_log(&path)
        .await
        .unwrap()
        .iter()
        .map(|result| (result.item(), result.score()))
        .collect::<Vec<_>>();
    items.sort_by_key(|(item, _)| *item);
    assert_eq!(
        items,
        vec![(WorkItem(1), 0.25), (WorkItem(3), 0.25), (WorkItem(5), 0.25)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn rerunning_against_the_same_log_appends_duplicates() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    run_into(&path).await;
    run_into(&path).await;

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents.matches("id,score").count(), 1);

    let results = read_result_log(&path).await.unwrap();
    assert_eq!(results.len(), 6);
    for id in [1, 3, 5] {
        assert_eq!(
            results
                .iter()
                .filter(|result| result.item() == WorkItem(id))
                .count(),
            2
        );
    }
}
