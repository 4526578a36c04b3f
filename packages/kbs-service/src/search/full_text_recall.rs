use std::sync::Arc;

use tokio::task::JoinSet;

use kbs_storage::models::LexicalPassage;

use crate::{
	LexicalQuery, Result,
	search::{
		ScoreEntry, ScoreKind, ScoredPassage, cmp_f32_desc,
		coordinator::{RecallContext, hydrate_collections, join_ordered},
		segment,
	},
};

/// Runs the lexical search on every dataset concurrently and merges the hits.
///
/// Hits in forbidden collections are dropped here since the lexical store does not filter them.
pub async fn full_text_recall(ctx: Arc<RecallContext>, query: &str) -> Result<Vec<ScoredPassage>> {
	let limit = ctx.limits.full_text;

	if limit == 0 {
		return Ok(Vec::new());
	}

	let terms = Arc::new(segment::segment(query));

	if terms.is_empty() {
		tracing::debug!("Query has no lexical terms; skipping full-text recall.");

		return Ok(Vec::new());
	}

	let mut tasks: JoinSet<Result<(usize, Vec<LexicalPassage>)>> = JoinSet::new();

	for (position, dataset_id) in ctx.dataset_ids.iter().copied().enumerate() {
		let ctx = Arc::clone(&ctx);
		let terms = Arc::clone(&terms);

		tasks.spawn(async move {
			let hits = ctx
				.collaborators
				.lexical
				.search(LexicalQuery { team_id: &ctx.team_id, dataset_id, terms: &terms, limit })
				.await?;

			Ok((position, hits))
		});
	}

	let per_dataset = join_ordered(tasks, ctx.dataset_ids.len()).await?;
	let mut hits: Vec<_> = per_dataset
		.into_iter()
		.flatten()
		.filter(|hit| !ctx.forbid.contains(&hit.collection_id))
		.collect();

	hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
	hits.truncate(limit as usize);

	let collections = hydrate_collections(&ctx, hits.iter().map(|hit| hit.collection_id)).await?;
	let passages = hits
		.into_iter()
		.enumerate()
		.map(|(rank, hit)| {
			let collection = collections.get(&hit.collection_id);

			ScoredPassage {
				id: hit.passage_id,
				q: hit.q,
				a: hit.a,
				chunk_index: hit.chunk_index,
				dataset_id: hit.dataset_id,
				collection_id: hit.collection_id,
				source_name: String::new(),
				source_id: None,
				source_link: None,
				scores: vec![ScoreEntry {
					kind: ScoreKind::FullText,
					value: hit.score,
					rank: rank as u32,
				}],
			}
			.with_collection(collection)
		})
		.collect::<Vec<_>>();

	tracing::debug!(hit_count = passages.len(), "Full-text recall finished.");

	Ok(passages)
}
