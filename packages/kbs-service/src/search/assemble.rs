use std::collections::HashSet;

use kbs_config::SearchFusion;

use crate::{
	TokenCounter,
	search::{
		RerankOutcome, ScoreKind, ScoredPassage, SearchMode, dedup::dedup_by_text,
		fusion::reciprocal_rank_fusion,
	},
};

pub struct AssembleArgs<'a> {
	pub embedding: Vec<ScoredPassage>,
	pub full_text: Vec<ScoredPassage>,
	pub outcome: RerankOutcome,
	pub fusion: &'a SearchFusion,
	pub search_mode: SearchMode,
	pub similarity: f32,
	pub token_limit: u32,
	pub overflow_margin: u32,
	pub tokens: &'a dyn TokenCounter,
}

#[derive(Debug)]
pub struct Assembled {
	pub items: Vec<ScoredPassage>,
	pub using_similarity_filter: bool,
}

/// Union of both recall lists for reranking. Embedding items win id collisions.
pub fn rerank_candidates(
	embedding: &[ScoredPassage],
	full_text: &[ScoredPassage],
) -> Vec<ScoredPassage> {
	let mut seen = HashSet::with_capacity(embedding.len() + full_text.len());
	let union = embedding
		.iter()
		.chain(full_text)
		.filter(|item| seen.insert(item.id))
		.cloned()
		.collect();

	dedup_by_text(union)
}

pub fn assemble(args: AssembleArgs<'_>) -> Assembled {
	let AssembleArgs {
		embedding,
		full_text,
		outcome,
		fusion,
		search_mode,
		similarity,
		token_limit,
		overflow_margin,
		tokens,
	} = args;
	let filter = similarity_filter(&outcome, search_mode);
	let fused = reciprocal_rank_fusion(vec![
		(fusion.embedding_k, embedding),
		(fusion.full_text_k, full_text),
		(fusion.rerank_k, outcome.into_passages()),
	]);
	let deduped = dedup_by_text(fused);
	let filtered: Vec<_> = match filter {
		Some(kind) => deduped.into_iter().filter(|item| passes(item, kind, similarity)).collect(),
		None => deduped,
	};
	let limit = token_limit as usize;
	let items = trim_to_budget(filtered, limit, limit + overflow_margin as usize, tokens);

	tracing::debug!(result_count = items.len(), "Assembled search results.");

	Assembled { items, using_similarity_filter: filter.is_some() }
}

/// The score kind the similarity threshold applies to, if any.
pub fn similarity_filter(outcome: &RerankOutcome, search_mode: SearchMode) -> Option<ScoreKind> {
	if outcome.is_applied() {
		Some(ScoreKind::ReRank)
	} else if search_mode == SearchMode::Embedding {
		Some(ScoreKind::Embedding)
	} else {
		None
	}
}

/// Items without an entry of `kind` pass.
fn passes(item: &ScoredPassage, kind: ScoreKind, similarity: f32) -> bool {
	item.best_score(kind).is_none_or(|score| score >= similarity)
}

/// Keeps a prefix of `items` within the token budget.
///
/// An item that would push the running total past `hard_limit` is excluded and stops the scan.
/// The item that first pushes it past `soft_limit` is kept and stops the scan. If nothing fits,
/// the first item is returned alone.
pub fn trim_to_budget(
	mut items: Vec<ScoredPassage>,
	soft_limit: usize,
	hard_limit: usize,
	tokens: &dyn TokenCounter,
) -> Vec<ScoredPassage> {
	let mut total = 0_usize;
	let mut kept = 0;

	for item in &items {
		total = total.saturating_add(tokens.count(&item.text()));

		if total > hard_limit {
			break;
		}

		kept += 1;

		if total > soft_limit {
			break;
		}
	}

	items.truncate(kept.max(1));

	items
}
