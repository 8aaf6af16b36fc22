//! Core data types flowing through the pipeline.

use std::fmt;

use crate::error::FanoutError;

/// Opaque identifier of a unit of work drawn from a [`crate::pool::WorkPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkItem(pub i64);

impl WorkItem {
    /// Returns the raw identifier.
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for WorkItem {
    fn from(value: i64) -> Self {
        WorkItem(value)
    }
}

/// Data retrieved from the source for a single [`WorkItem`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub item: WorkItem,
    pub text: String,
}

impl FetchResult {
    pub fn new(item: WorkItem, text: impl Into<String>) -> Self {
        Self {
            item,
            text: text.into(),
        }
    }
}

/// Score derived for a single [`WorkItem`].
///
/// Once built a result is never mutated; it is handed to the sink as is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessedResult {
    item: WorkItem,
    score: f64,
}

impl ProcessedResult {
    pub fn new(item: WorkItem, score: f64) -> Self {
        Self { item, score }
    }

    pub fn item(&self) -> WorkItem {
        self.item
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Final outcome of running one [`WorkItem`] through fetch and process.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// The item was fetched and scored.
    Processed(ProcessedResult),
    /// The source has no record for the item.
    Absent,
    /// Fetching or processing the item failed. The error was already logged.
    Failed(FanoutError),
}

impl ItemOutcome {
    /// Returns the outcome type without its payload.
    pub fn outcome_type(&self) -> ItemOutcomeType {
        match self {
            ItemOutcome::Processed(_) => ItemOutcomeType::Processed,
            ItemOutcome::Absent => ItemOutcomeType::Absent,
            ItemOutcome::Failed(_) => ItemOutcomeType::Failed,
        }
    }
}

/// Payload-free discriminant of [`ItemOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemOutcomeType {
    Processed,
    Absent,
    Failed,
}

impl fmt::Display for ItemOutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcomeType::Processed => write!(f, "processed"),
            ItemOutcomeType::Absent => write!(f, "absent"),
            ItemOutcomeType::Failed => write!(f, "failed"),
        }
    }
}
