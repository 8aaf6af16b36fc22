use fail::FailScenario;
use fanout::error::ErrorKind;
use fanout::failpoints::CSV_WRITE;
use fanout::sink::ResultSink;
use fanout::sink::csv::{CsvFileSink, read_result_log};
use fanout::types::{ProcessedResult, WorkItem};
use telemetry::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn interrupted_write_leaves_no_partial_row() {
    init_test_tracing();
    let scenario = FailScenario::setup();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let sink = CsvFileSink::open(&path).await.unwrap();

    sink.append(ProcessedResult::new(WorkItem(1), 0.25))
        .await
        .unwrap();

    fail::cfg(CSV_WRITE, "1*return").unwrap();
    let err = sink
        .append(ProcessedResult::new(WorkItem(123456), 0.123456789))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SinkWriteFailed);

    sink.append(ProcessedResult::new(WorkItem(3), 0.5))
        .await
        .unwrap();
    sink.shutdown().await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents, "id,score\n1,0.25\n3,0.5\n");
    assert_eq!(
        read_result_log(&path).await.unwrap(),
        vec![
            ProcessedResult::new(WorkItem(1), 0.25),
            ProcessedResult::new(WorkItem(3), 0.5)
        ]
    );

    scenario.teardown();
}
