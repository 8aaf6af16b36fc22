use crate::bail;
use crate::error::{ErrorKind, FanoutResult};
use crate::processor::Tokenizer;

/// [`Tokenizer`] that lowercases text and splits it on anything that is not alphanumeric.
///
/// Empty fragments are dropped. An optional token limit mirrors the maximum input length of
/// real models; text producing more tokens fails instead of being truncated silently.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceTokenizer {
    max_tokens: Option<usize>,
}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(max_tokens: usize) -> Self {
        Self {
            max_tokens: Some(max_tokens),
        }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> FanoutResult<Vec<String>> {
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>();

        if let Some(max_tokens) = self.max_tokens
            && tokens.len() > max_tokens
        {
            bail!(
                ErrorKind::TokenizationFailed,
                "Text exceeds the token limit",
                format!("{} tokens produced, limit is {max_tokens}", tokens.len())
            );
        }

        Ok(tokens)
    }
}
