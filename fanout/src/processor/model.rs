use std::collections::HashMap;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::processor::ScoringModel;

/// [`ScoringModel`] returning the same score for every input.
#[derive(Debug, Clone, Copy)]
pub struct FixedScoreModel {
    score: f64,
}

impl FixedScoreModel {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl ScoringModel for FixedScoreModel {
    fn score(&self, _tokens: &[String]) -> FanoutResult<f64> {
        Ok(self.score)
    }
}

/// [`ScoringModel`] drawing a uniform score in `[0, 1)` for every input.
///
/// Stands in for a real model when only the shape of the pipeline matters. The generator sits
/// behind a lock because all workers share one model.
#[derive(Debug)]
pub struct RandomScoreModel {
    rng: Mutex<StdRng>,
}

impl RandomScoreModel {
    /// Creates a model seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a model with a fixed seed, producing a reproducible score sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomScoreModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringModel for RandomScoreModel {
    fn score(&self, _tokens: &[String]) -> FanoutResult<f64> {
        let Ok(mut rng) = self.rng.lock() else {
            bail!(
                ErrorKind::ScoringFailed,
                "Random model generator lock poisoned"
            );
        };

        Ok(rng.r#gen::<f64>())
    }
}

/// [`ScoringModel`] averaging per-token weights from a fixed lexicon.
///
/// Tokens missing from the lexicon weigh zero. Scoring an empty token sequence fails since
/// there is nothing to average.
#[derive(Debug, Clone, Default)]
pub struct LexiconScoreModel {
    weights: HashMap<String, f64>,
}

impl LexiconScoreModel {
    pub fn new<I, K>(weights: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            weights: weights
                .into_iter()
                .map(|(token, weight)| (token.into(), weight))
                .collect(),
        }
    }
}

impl ScoringModel for LexiconScoreModel {
    fn score(&self, tokens: &[String]) -> FanoutResult<f64> {
        if tokens.is_empty() {
            bail!(
                ErrorKind::ProcessingFailed,
                "Cannot score an empty token sequence"
            );
        }

        let total: f64 = tokens
            .iter()
            .map(|token| self.weights.get(token).copied().unwrap_or(0.0))
            .sum();

        Ok(total / tokens.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn seeded_random_model_is_reproducible() {
        let first = RandomScoreModel::with_seed(11);
        let second = RandomScoreModel::with_seed(11);

        for _ in 0..5 {
            let score = first.score(&[]).unwrap();
            assert_eq!(score, second.score(&[]).unwrap());
            assert!((0.0..1.0).contains(&score));
        }
    }

    #[test]
    fn lexicon_model_averages_known_weights() {
        let model = LexiconScoreModel::new([("good", 1.0), ("bad", -1.0)]);

        let score = model.score(&tokens(&["good", "good", "bad", "plot"])).unwrap();

        assert_eq!(score, 0.25);
    }

    #[test]
    fn lexicon_model_rejects_empty_input() {
        let model = LexiconScoreModel::new([("good", 1.0)]);

        let err = model.score(&[]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ProcessingFailed);
    }
}
