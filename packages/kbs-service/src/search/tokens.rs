use tokenizers::Tokenizer;

use crate::{Error, Result, TokenCounter, search::segment::is_cjk};

/// Counts tokens with a Hugging Face tokenizer.
pub struct TokenizerCounter {
	tokenizer: Tokenizer,
}
impl TokenizerCounter {
	pub fn new(tokenizer: Tokenizer) -> Self {
		Self { tokenizer }
	}

	pub fn from_pretrained(repo: &str) -> Result<Self> {
		let tokenizer = Tokenizer::from_pretrained(repo, None).map_err(|err| Error::Internal {
			message: format!("Failed to load tokenizer {repo:?}: {err}."),
		})?;

		Ok(Self::new(tokenizer))
	}
}
impl TokenCounter for TokenizerCounter {
	fn count(&self, text: &str) -> usize {
		match self.tokenizer.encode(text, false) {
			Ok(encoding) => encoding.len(),
			Err(err) => {
				tracing::warn!(error = %err, "Tokenizer failed; estimating token count.");

				EstimatedTokenCounter.count(text)
			},
		}
	}
}

/// Approximates token counts without a model: one token per CJK character or punctuation mark,
/// one per four characters of other letter/digit runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTokenCounter;
impl TokenCounter for EstimatedTokenCounter {
	fn count(&self, text: &str) -> usize {
		let mut total = 0;
		let mut run: usize = 0;

		for ch in text.chars() {
			if ch.is_alphanumeric() && !is_cjk(ch) {
				run += 1;

				continue;
			}

			total += run.div_ceil(4);
			run = 0;

			if !ch.is_whitespace() {
				total += 1;
			}
		}

		total + run.div_ceil(4)
	}
}
