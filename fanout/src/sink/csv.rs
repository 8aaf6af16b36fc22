use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::fanout_error;
use crate::sink::ResultSink;
use crate::types::{ProcessedResult, WorkItem};

/// Header written once at the top of a new result log.
pub const RESULT_LOG_HEADER: &str = "id,score";

#[derive(Debug)]
struct Inner {
    file: File,
    /// Length of the file up to the end of the last fully written record.
    committed_len: u64,
}

/// [`ResultSink`] appending records as CSV rows to a file.
///
/// The file is opened in append mode and created if missing; the header is written only when
/// the file is empty, so reopening an existing log keeps its rows. Running the same input twice
/// against one log therefore yields duplicate rows: the log is append-only, not idempotent.
///
/// Each append formats the full row before taking the lock and writes it with a single
/// `write_all` followed by a flush. If the write fails the file is truncated back to the last
/// committed record, so a reader never sees a partial row.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl CsvFileSink {
    /// Opens the result log at `path`, writing the header if the file is new or empty.
    pub async fn open(path: impl AsRef<Path>) -> FanoutResult<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|err| {
                fanout_error!(
                    ErrorKind::SinkWriteFailed,
                    "Failed to open result log",
                    format!("could not open `{}`: {err}", path.display()),
                    source: err
                )
            })?;

        let mut committed_len = file.metadata().await?.len();
        if committed_len == 0 {
            let header = format!("{RESULT_LOG_HEADER}\n");
            file.write_all(header.as_bytes()).await?;
            file.flush().await?;
            committed_len = header.len() as u64;

            info!(path = %path.display(), "created result log");
        } else {
            info!(
                path = %path.display(),
                bytes = committed_len,
                "appending to existing result log"
            );
        }

        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(Inner {
                file,
                committed_len,
            })),
        })
    }

    /// Returns the path of the result log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvFileSink {
    fn name() -> &'static str {
        "csv"
    }

    async fn append(&self, result: ProcessedResult) -> FanoutResult<()> {
        let row = format_row(&result);

        let mut inner = self.inner.lock().await;

        if let Err(err) = write_row(&mut inner.file, &row).await {
            let committed_len = inner.committed_len;
            if let Err(truncate_err) = inner.file.set_len(committed_len).await {
                error!(
                    path = %self.path.display(),
                    error = %truncate_err,
                    "failed to roll back partial record"
                );
            }

            bail!(
                ErrorKind::SinkWriteFailed,
                "Failed to append to result log",
                format!(
                    "could not write item {} to `{}`: {err}",
                    result.item(),
                    self.path.display()
                ),
                source: err
            );
        }

        inner.committed_len += row.len() as u64;

        Ok(())
    }

    async fn shutdown(&self) -> FanoutResult<()> {
        let inner = self.inner.lock().await;
        inner.file.sync_all().await?;

        info!(path = %self.path.display(), "result log synced");

        Ok(())
    }
}

async fn write_row(file: &mut File, row: &str) -> io::Result<()> {
    #[cfg(feature = "failpoints")]
    if fail::eval(crate::failpoints::CSV_WRITE, |_| ()).is_some() {
        file.write_all(&row.as_bytes()[..row.len() / 2]).await?;
        file.flush().await?;
        return Err(io::Error::other("write interrupted by fail point"));
    }

    file.write_all(row.as_bytes()).await?;
    file.flush().await
}

fn format_row(result: &ProcessedResult) -> String {
    format!("{},{}\n", result.item(), result.score())
}

/// Reads a result log written by [`CsvFileSink`] back into records.
///
/// Fails on a missing or unexpected header and on any malformed row.
pub async fn read_result_log(path: impl AsRef<Path>) -> FanoutResult<Vec<ProcessedResult>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await?;

    let mut lines = contents.lines();
    match lines.next() {
        Some(RESULT_LOG_HEADER) => {}
        other => bail!(
            ErrorKind::InvalidData,
            "Result log header is missing",
            format!(
                "expected `{RESULT_LOG_HEADER}` at the top of `{}`, found {other:?}",
                path.display()
            )
        ),
    }

    lines.map(parse_row).collect()
}

fn parse_row(line: &str) -> FanoutResult<ProcessedResult> {
    let Some((id, score)) = line.split_once(',') else {
        bail!(
            ErrorKind::InvalidData,
            "Malformed result log row",
            format!("row `{line}` has no separator")
        );
    };

    let id = id.parse::<i64>().map_err(|err| {
        fanout_error!(
            ErrorKind::InvalidData,
            "Malformed result log row",
            format!("row `{line}` has an invalid id"),
            source: err
        )
    })?;
    let score = score.parse::<f64>().map_err(|err| {
        fanout_error!(
            ErrorKind::InvalidData,
            "Malformed result log row",
            format!("row `{line}` has an invalid score"),
            source: err
        )
    })?;

    Ok(ProcessedResult::new(WorkItem(id), score))
}
