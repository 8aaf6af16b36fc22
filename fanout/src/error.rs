//! Error types and result definitions for fanout operations.
//!
//! Provides an error system with classification, aggregation, and captured diagnostic metadata.
//! The [`FanoutError`] type supports single errors, errors with additional detail, and multiple
//! aggregated errors, which is how the coordinator reports the failures of several workers at once.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for fanout operations using [`FanoutError`] as the error type.
pub type FanoutResult<T> = Result<T, FanoutError>;

/// Detailed payload stored for single [`FanoutError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for fanout operations.
///
/// [`FanoutError`] can represent a single error, an error with additional detail, or multiple
/// aggregated errors.
#[derive(Debug, Clone)]
pub struct FanoutError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Single error payload holding rich metadata.
    Single(ErrorPayload),
    /// Multiple aggregated errors.
    ///
    /// This variant is mainly useful to capture multiple workers failures.
    Many {
        errors: Vec<FanoutError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur while running a fanout.
///
/// Kinds are grouped by the stage that produces them. Whether an error stops a worker depends on
/// the stage it comes from, not on its kind.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Fetch Errors
    SourceConnectionFailed,
    SourceQueryFailed,
    FetchFailed,
    InvalidData,

    // Processing Errors
    TokenizationFailed,
    ScoringFailed,
    ProcessingFailed,

    // Sink Errors
    SinkWriteFailed,
    IoError,

    // System Errors
    WorkPoolCorrupted,
    WorkerPanic,
    ConfigError,

    // Unknown / Uncategorized
    Unknown,

    // Special error kind returned by fault injection points in tests.
    #[cfg(feature = "failpoints")]
    InjectedFailure,
}

impl FanoutError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect when called on aggregated errors because aggregates forward the first
    /// contained error as their source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }

        self
    }

    /// Creates a [`FanoutError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        FanoutError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl fmt::Display for FanoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                write!(
                    f,
                    "[{:?}] {} @ {}",
                    payload.kind, payload.description, payload.location
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    write_indented(f, detail, "    ")?;
                }

                // Rendered only when backtraces were enabled through `RUST_BACKTRACE`.
                if payload.backtrace.status() == BacktraceStatus::Captured {
                    write!(f, "\n  Backtrace:")?;
                    write_indented(f, &payload.backtrace.to_string(), "    ")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                write!(f, "[Many] {} errors aggregated @ {location}", errors.len())?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let (first_line, rest) = rendered
                        .split_once('\n')
                        .unwrap_or((rendered.as_str(), ""));

                    write!(f, "\n  {}. {first_line}", index + 1)?;
                    write_indented(f, rest, "     ")?;
                }

                Ok(())
            }
        }
    }
}

/// Writes every line of `text` on a new line prefixed by `indent`.
fn write_indented(f: &mut fmt::Formatter<'_>, text: &str, indent: &str) -> fmt::Result {
    for line in text.lines() {
        write!(f, "\n{indent}{line}")?;
    }

    Ok(())
}

impl error::Error for FanoutError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates a [`FanoutError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for FanoutError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> FanoutError {
        FanoutError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`FanoutError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for FanoutError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> FanoutError {
        FanoutError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Creates a [`FanoutError`] from a vector of errors for aggregation.
///
/// If the vector contains exactly one error, returns that error directly without wrapping
/// it in the [`ErrorRepr::Many`] variant.
impl<E> From<Vec<E>> for FanoutError
where
    E: Into<FanoutError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> FanoutError {
        let location = Location::caller();

        let mut errors: Vec<FanoutError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        FanoutError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`FanoutError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for FanoutError {
    #[track_caller]
    fn from(err: std::io::Error) -> FanoutError {
        let detail = err.to_string();
        FanoutError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlx::Error`] to [`FanoutError`] with the appropriate error kind.
///
/// Connection-level failures map to [`ErrorKind::SourceConnectionFailed`], everything else the
/// store reports maps to [`ErrorKind::SourceQueryFailed`].
impl From<sqlx::Error> for FanoutError {
    #[track_caller]
    fn from(err: sqlx::Error) -> FanoutError {
        let (kind, description) = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut => (
                ErrorKind::SourceConnectionFailed,
                "Database connection failed",
            ),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                (ErrorKind::InvalidData, "Database row decoding failed")
            }
            _ => (ErrorKind::SourceQueryFailed, "Database operation failed"),
        };

        let detail = err.to_string();
        FanoutError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`config::shared::ValidationError`] to [`FanoutError`] with [`ErrorKind::ConfigError`].
impl From<config::shared::ValidationError> for FanoutError {
    #[track_caller]
    fn from(err: config::shared::ValidationError) -> FanoutError {
        let detail = err.to_string();
        FanoutError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::fanout_error;

    #[test]
    fn single_error_exposes_kind_and_detail() {
        let err = fanout_error!(ErrorKind::FetchFailed, "Fetch failed", "item 7");

        assert_eq!(err.kind(), ErrorKind::FetchFailed);
        assert_eq!(err.detail(), Some("item 7"));
        assert!(err.source().is_none());
    }

    #[test]
    fn aggregating_one_error_returns_it_unwrapped() {
        let err = FanoutError::from(vec![fanout_error!(
            ErrorKind::SinkWriteFailed,
            "Sink write failed"
        )]);

        assert_eq!(err.kind(), ErrorKind::SinkWriteFailed);
        assert!(err.to_string().starts_with("[SinkWriteFailed] Sink write failed @ "));
    }

    #[test]
    fn aggregated_errors_render_every_error() {
        let err = FanoutError::from(vec![
            fanout_error!(ErrorKind::SinkWriteFailed, "Sink write failed"),
            fanout_error!(ErrorKind::WorkerPanic, "Worker panicked", "worker 1"),
        ]);
        let rendered = err.to_string();

        assert_eq!(err.kind(), ErrorKind::SinkWriteFailed);
        assert_eq!(err.detail(), Some("worker 1"));
        assert!(rendered.starts_with("[Many] 2 errors aggregated"));
        assert!(rendered.contains("\n  1. [SinkWriteFailed] Sink write failed"));
        assert!(rendered.contains("\n  2. [WorkerPanic] Worker panicked"));
        assert!(err.source().is_some());
    }

    #[test]
    fn io_errors_keep_their_source() {
        let io = std::io::Error::other("disk full");
        let err = FanoutError::from(io);

        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(err.detail(), Some("disk full"));
        assert!(err.source().is_some());
    }

    #[test]
    fn display_includes_kind_description_and_detail() {
        let err = fanout_error!(ErrorKind::ScoringFailed, "Scoring failed", "nan score");
        let rendered = err.to_string();

        assert!(rendered.starts_with("[ScoringFailed] Scoring failed @ "));
        assert!(rendered.contains("Detail:\n    nan score"));
    }
}
