use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::trace;

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::fanout_error;
use crate::types::{FetchResult, ProcessedResult};

/// Splits fetched text into tokens.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> FanoutResult<Vec<String>>;
}

/// Derives a score from a token sequence.
///
/// A model may be stochastic; determinism is a property of the model, not of [`Processor`].
pub trait ScoringModel {
    fn score(&self, tokens: &[String]) -> FanoutResult<f64>;
}

/// Transforms a [`FetchResult`] into a [`ProcessedResult`] by tokenizing and then scoring.
///
/// Processing is CPU-only and holds no shared mutable state, so one processor is shared by all
/// workers of a run.
#[derive(Debug, Clone)]
pub struct Processor<T, M> {
    tokenizer: T,
    model: M,
}

impl<T, M> Processor<T, M>
where
    T: Tokenizer,
    M: ScoringModel,
{
    pub fn new(tokenizer: T, model: M) -> Self {
        Self { tokenizer, model }
    }

    /// Tokenizes the fetched text and scores the tokens.
    ///
    /// Non-finite scores are rejected since they cannot be persisted meaningfully. A panic in
    /// the tokenizer or the model is caught and returned as [`ErrorKind::ProcessingFailed`].
    pub fn process(&self, fetched: FetchResult) -> FanoutResult<ProcessedResult> {
        let item = fetched.item;

        let score = catch_unwind(AssertUnwindSafe(|| self.score(&fetched))).map_err(|panic| {
            fanout_error!(
                ErrorKind::ProcessingFailed,
                "Processing panicked",
                format!("item {item}: {}", panic_message(panic.as_ref()))
            )
        })??;

        Ok(ProcessedResult::new(item, score))
    }

    fn score(&self, fetched: &FetchResult) -> FanoutResult<f64> {
        let tokens = self.tokenizer.tokenize(&fetched.text)?;
        trace!(item_id = fetched.item.id(), tokens = tokens.len(), "tokenized item");

        let score = self.model.score(&tokens)?;
        if !score.is_finite() {
            bail!(
                ErrorKind::ScoringFailed,
                "Model returned a non-finite score",
                format!("item {} scored {score}", fetched.item)
            );
        }

        Ok(score)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
