use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
	#[default]
	Embedding,
	FullText,
	Mixed,
}
impl SearchMode {
	/// Never fails: unrecognized modes fall back to [`SearchMode::Embedding`].
	pub fn parse(raw: &str) -> Self {
		match raw.trim() {
			"fullText" | "fullTextRecall" => Self::FullText,
			"mixed" | "mixedRecall" => Self::Mixed,
			_ => Self::Embedding,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Embedding => "embedding",
			Self::FullText => "fullText",
			Self::Mixed => "mixed",
		}
	}

	pub fn recall_limits(self) -> RecallLimits {
		match self {
			Self::Embedding => RecallLimits { embedding: 100, full_text: 0 },
			Self::FullText => RecallLimits { embedding: 0, full_text: 100 },
			Self::Mixed => RecallLimits { embedding: 80, full_text: 60 },
		}
	}
}

/// Per-source candidate quotas for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecallLimits {
	pub embedding: u32,
	pub full_text: u32,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limits_follow_mode() {
		assert_eq!(
			SearchMode::Embedding.recall_limits(),
			RecallLimits { embedding: 100, full_text: 0 }
		);
		assert_eq!(
			SearchMode::FullText.recall_limits(),
			RecallLimits { embedding: 0, full_text: 100 }
		);
		assert_eq!(
			SearchMode::Mixed.recall_limits(),
			RecallLimits { embedding: 80, full_text: 60 }
		);
	}

	#[test]
	fn unknown_modes_fall_back_to_embedding() {
		for raw in ["", "semantic", "FULLTEXT", "hybrid"] {
			let mode = SearchMode::parse(raw);

			assert_eq!(mode, SearchMode::Embedding);
			assert_eq!(mode.recall_limits(), RecallLimits { embedding: 100, full_text: 0 });
		}
	}

	#[test]
	fn accepts_legacy_recall_names() {
		assert_eq!(SearchMode::parse("fullTextRecall"), SearchMode::FullText);
		assert_eq!(SearchMode::parse("mixedRecall"), SearchMode::Mixed);
		assert_eq!(SearchMode::parse(" mixed "), SearchMode::Mixed);
	}
}
