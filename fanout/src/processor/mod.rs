//! Process stage of the pipeline: tokenization and scoring.
//!
//! [`Tokenizer`] and [`ScoringModel`] are injected into a [`Processor`] so concrete
//! implementations can be swapped without touching the worker loop.

mod base;
pub mod model;
pub mod tokenizer;

pub use base::{Processor, ScoringModel, Tokenizer};
pub use model::{FixedScoreModel, LexiconScoreModel, RandomScoreModel};
pub use tokenizer::WhitespaceTokenizer;
