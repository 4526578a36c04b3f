pub mod assemble;
pub mod coordinator;
pub mod dedup;
pub mod embedding_recall;
pub mod full_text_recall;
pub mod fusion;
pub mod mode;
pub mod rerank;
pub mod segment;
pub mod tokens;

pub use mode::{RecallLimits, SearchMode};
pub use rerank::RerankOutcome;

use std::{cmp::Ordering, collections::HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kbs_storage::models::Collection;

use crate::{Error, KbsService, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub team_id: String,
	/// Embedding model; the configured provider model when absent.
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub similarity: Option<f32>,
	#[serde(default)]
	pub token_limit: Option<u32>,
	pub dataset_ids: Vec<Uuid>,
	/// Raw mode string. Unknown values fall back to `embedding`.
	#[serde(default)]
	pub search_mode: Option<String>,
	#[serde(default)]
	pub rerank: bool,
	#[serde(default)]
	pub rerank_query: Option<String>,
	pub queries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreKind {
	Embedding,
	FullText,
	ReRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
	pub kind: ScoreKind,
	pub value: f32,
	pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
	pub id: Uuid,
	pub q: String,
	pub a: String,
	pub chunk_index: i32,
	pub dataset_id: Uuid,
	pub collection_id: Uuid,
	pub source_name: String,
	pub source_id: Option<String>,
	pub source_link: Option<String>,
	pub scores: Vec<ScoreEntry>,
}
impl ScoredPassage {
	/// Highest value among entries of `kind`, if any.
	pub fn best_score(&self, kind: ScoreKind) -> Option<f32> {
		self.scores
			.iter()
			.filter(|entry| entry.kind == kind)
			.map(|entry| entry.value)
			.reduce(f32::max)
	}

	pub(crate) fn text(&self) -> String {
		format!("{}{}", self.q, self.a)
	}

	pub(crate) fn with_collection(mut self, collection: Option<&Collection>) -> Self {
		if let Some(collection) = collection {
			self.source_name = collection.name.clone();
			self.source_id = collection.source_id.clone();
			self.source_link = collection.source_link.clone();
		}

		self
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<ScoredPassage>,
	pub embedding_tokens: u64,
	pub search_mode: SearchMode,
	pub token_limit: u32,
	pub similarity: f32,
	pub using_rerank: bool,
	pub using_similarity_filter: bool,
}

impl KbsService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let team_id = req.team_id.trim();

		if team_id.is_empty() {
			return Err(Error::invalid("team_id is required."));
		}
		if req.dataset_ids.is_empty() {
			return Err(Error::invalid("dataset_ids must contain at least one dataset."));
		}

		let queries = normalize_queries(&req.queries, self.cfg.search.max_queries);

		if queries.is_empty() {
			return Err(Error::invalid("queries must contain at least one non-empty query."));
		}

		let similarity = req.similarity.unwrap_or(0.0);

		if !similarity.is_finite() || !(0.0..=1.0).contains(&similarity) {
			return Err(Error::invalid("similarity must be between 0 and 1."));
		}

		let search_mode = req.search_mode.as_deref().map(SearchMode::parse).unwrap_or_default();
		let limits = search_mode.recall_limits();
		let token_limit = req
			.token_limit
			.unwrap_or(self.cfg.search.default_token_limit)
			.clamp(1, self.cfg.search.max_token_limit.max(1));
		let model = req
			.model
			.as_deref()
			.map(str::trim)
			.filter(|model| !model.is_empty())
			.unwrap_or(&self.cfg.providers.embedding.model)
			.to_string();
		let rerank_provider = self.rerank.provider().filter(|_| req.rerank);
		let rerank_query = req
			.rerank_query
			.as_deref()
			.map(str::trim)
			.filter(|query| !query.is_empty())
			.unwrap_or(&queries[0])
			.to_string();
		let mut dataset_ids = Vec::with_capacity(req.dataset_ids.len());
		let mut seen_datasets = HashSet::new();

		for dataset_id in &req.dataset_ids {
			if seen_datasets.insert(*dataset_id) {
				dataset_ids.push(*dataset_id);
			}
		}

		tracing::debug!(
			team_id,
			dataset_count = dataset_ids.len(),
			query_count = queries.len(),
			search_mode = search_mode.as_str(),
			embedding_limit = limits.embedding,
			full_text_limit = limits.full_text,
			"Starting hybrid recall."
		);

		let recalled = coordinator::recall(
			&self.collaborators,
			coordinator::RecallScope {
				team_id: team_id.to_string(),
				dataset_ids,
				model,
				limits,
			},
			&queries,
			&self.cfg.search.fusion,
		)
		.await?;
		let candidates = assemble::rerank_candidates(&recalled.embedding, &recalled.full_text);
		let outcome = rerank::rerank_stage(rerank_provider, &rerank_query, &candidates).await;
		let using_rerank = outcome.is_applied();
		let assembled = assemble::assemble(assemble::AssembleArgs {
			embedding: recalled.embedding,
			full_text: recalled.full_text,
			outcome,
			fusion: &self.cfg.search.fusion,
			search_mode,
			similarity,
			token_limit,
			overflow_margin: self.cfg.search.token_overflow_margin,
			tokens: self.collaborators.tokens.as_ref(),
		});

		tracing::info!(
			team_id,
			result_count = assembled.items.len(),
			embedding_tokens = recalled.embedding_tokens,
			search_mode = search_mode.as_str(),
			using_rerank,
			using_similarity_filter = assembled.using_similarity_filter,
			"Search completed."
		);

		Ok(SearchResponse {
			items: assembled.items,
			embedding_tokens: recalled.embedding_tokens,
			search_mode,
			token_limit,
			similarity,
			using_rerank,
			using_similarity_filter: assembled.using_similarity_filter,
		})
	}
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	b.total_cmp(&a)
}

fn normalize_queries(queries: &[String], max_queries: u32) -> Vec<String> {
	let mut out = Vec::new();
	let mut seen = HashSet::new();

	for query in queries {
		if out.len() >= max_queries as usize {
			break;
		}

		let trimmed = query.trim();

		if !trimmed.is_empty() && seen.insert(trimmed) {
			out.push(trimmed.to_string());
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn passage(scores: Vec<ScoreEntry>) -> ScoredPassage {
		ScoredPassage {
			id: Uuid::new_v4(),
			q: "q".to_string(),
			a: "a".to_string(),
			chunk_index: 0,
			dataset_id: Uuid::nil(),
			collection_id: Uuid::nil(),
			source_name: String::new(),
			source_id: None,
			source_link: None,
			scores,
		}
	}

	#[test]
	fn normalizes_queries_in_order() {
		let queries = vec![
			" refunds ".to_string(),
			String::new(),
			"refunds".to_string(),
			"shipping".to_string(),
			"returns".to_string(),
		];

		assert_eq!(normalize_queries(&queries, 2), vec!["refunds", "shipping"]);
	}

	#[test]
	fn best_score_takes_the_maximum_of_one_kind() {
		let item = passage(vec![
			ScoreEntry { kind: ScoreKind::Embedding, value: 0.4, rank: 3 },
			ScoreEntry { kind: ScoreKind::Embedding, value: 0.7, rank: 0 },
			ScoreEntry { kind: ScoreKind::FullText, value: 9.0, rank: 0 },
		]);

		assert_eq!(item.best_score(ScoreKind::Embedding), Some(0.7));
		assert_eq!(item.best_score(ScoreKind::ReRank), None);
	}

	#[test]
	fn score_kinds_use_wire_names() {
		let json = serde_json::to_value([ScoreKind::Embedding, ScoreKind::FullText, ScoreKind::ReRank])
			.expect("serialize failed");

		assert_eq!(json, serde_json::json!(["embedding", "fullText", "reRank"]));
	}
}
