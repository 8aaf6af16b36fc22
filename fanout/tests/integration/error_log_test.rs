use config::shared::WorkerPoolConfig;
use fanout::coordinator::Coordinator;
use fanout::fetcher::SqlFetcher;
use fanout::pool::WorkPool;
use fanout::processor::{LexiconScoreModel, Processor, WhitespaceTokenizer};
use fanout::sink::memory::MemorySink;
use fanout::source::memory::MemoryStore;
use fanout::test_utils::fetcher::ScriptedFetcher;
use fanout::test_utils::logs::ErrorLogCapture;
use fanout::types::WorkItem;
use tracing_subscriber::layer::SubscriberExt;

fn lexicon_processor() -> Processor<WhitespaceTokenizer, LexiconScoreModel> {
    Processor::new(
        WhitespaceTokenizer::new(),
        LexiconScoreModel::new([("good", 1.0), ("bad", -1.0)]),
    )
}

// Workers must run on the test thread for the thread-local subscriber to see their events,
// hence the current-thread runtime.
#[tokio::test]
async fn each_failed_item_is_logged_exactly_once() {
    let capture = ErrorLogCapture::new();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let store = MemoryStore::with_documents([
        (1, "good"),
        (2, "bad"),
        (3, ""),
        (4, "good and bad"),
        (5, "good good"),
    ]);
    store.fail_queries_for(2).await;
    let sink = MemorySink::new();
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(3),
        WorkPool::new(1..=6_i64),
        SqlFetcher::new(store),
        lexicon_processor(),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.absent, 1);

    // Item 2 fails to fetch, item 3 has no tokens to score.
    assert_eq!(capture.count_for_item(2), 1);
    assert_eq!(capture.count_for_item(3), 1);
    for item_id in [1, 4, 5, 6] {
        assert_eq!(capture.count_for_item(item_id), 0);
    }

    let events = capture.events();
    let fetch_error = events
        .iter()
        .find(|event| event.item_id == Some(2))
        .unwrap();
    assert_eq!(fetch_error.message, "failed to fetch item");
    assert!(fetch_error.error.is_some());

    let items = sink
        .results()
        .await
        .iter()
        .map(|result| result.item())
        .collect::<Vec<_>>();
    assert!(!items.contains(&WorkItem(2)));
    assert!(!items.contains(&WorkItem(3)));
}

#[tokio::test]
async fn scripted_failures_do_not_affect_other_items() {
    let capture = ErrorLogCapture::new();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let sink = MemorySink::new();
    let coordinator = Coordinator::new(
        WorkerPoolConfig::fixed(4),
        WorkPool::from_range(0..50),
        ScriptedFetcher::new("good").failing_ids([7, 21, 49]),
        lexicon_processor(),
        sink.clone(),
    );

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.failed, 3);
    assert_eq!(summary.processed, 47);
    assert_eq!(
        capture
            .events()
            .iter()
            .filter(|event| event.item_id.is_some())
            .count(),
        3
    );
    for item_id in [7, 21, 49] {
        assert_eq!(capture.count_for_item(item_id), 1);
    }
    assert!(
        sink.results()
            .await
            .iter()
            .all(|result| result.score() == 1.0)
    );
}
