use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
	PassageQuery, Result, VectorQuery,
	search::{
		ScoreEntry, ScoreKind, ScoredPassage, cmp_f32_desc,
		coordinator::{RecallContext, hydrate_collections},
	},
};

#[derive(Debug, Default)]
pub struct EmbeddingRecall {
	pub passages: Vec<ScoredPassage>,
	pub tokens: u64,
}

/// Embeds `query`, searches the vector index and hydrates the matched passages.
///
/// A passage matched through several index fragments keeps its best similarity.
pub async fn embedding_recall(ctx: &RecallContext, query: &str) -> Result<EmbeddingRecall> {
	let limit = ctx.limits.embedding;

	if limit == 0 {
		return Ok(EmbeddingRecall::default());
	}

	let embedding = ctx.collaborators.embedding.embed(&ctx.model, query).await?;
	let hits = ctx
		.collaborators
		.vector_index
		.search(VectorQuery {
			team_id: &ctx.team_id,
			dataset_ids: &ctx.dataset_ids,
			vector: embedding.vector,
			limit,
			forbid: &ctx.forbid,
		})
		.await?;

	if hits.is_empty() {
		return Ok(EmbeddingRecall { passages: Vec::new(), tokens: embedding.tokens });
	}

	let mut best: HashMap<Uuid, f32> = HashMap::with_capacity(hits.len());
	let mut index_ids = Vec::with_capacity(hits.len());

	for hit in &hits {
		match best.get_mut(&hit.index_id) {
			Some(score) => *score = score.max(hit.score),
			None => {
				best.insert(hit.index_id, hit.score);
				index_ids.push(hit.index_id);
			},
		}
	}

	let passages = ctx
		.collaborators
		.passages
		.fetch_passages(PassageQuery {
			team_id: &ctx.team_id,
			dataset_ids: &ctx.dataset_ids,
			forbid: &ctx.forbid,
			index_ids: &index_ids,
		})
		.await?;
	let mut hydrated_fragments = HashSet::new();
	let mut scored = Vec::with_capacity(passages.len());

	for passage in passages {
		let score = passage
			.index_ids
			.iter()
			.filter_map(|index_id| best.get(index_id).copied())
			.reduce(f32::max);

		hydrated_fragments.extend(passage.index_ids.iter().copied());

		let Some(score) = score else {
			continue;
		};

		scored.push((passage, score));
	}

	let missing = index_ids.iter().filter(|id| !hydrated_fragments.contains(*id)).count();

	if missing > 0 {
		tracing::warn!(missing, "Skipping vector hits without a stored passage.");
	}

	scored.sort_by(|(_, a), (_, b)| cmp_f32_desc(*a, *b));

	let collections =
		hydrate_collections(ctx, scored.iter().map(|(passage, _)| passage.collection_id)).await?;
	let passages = scored
		.into_iter()
		.enumerate()
		.map(|(rank, (passage, score))| {
			let collection = collections.get(&passage.collection_id);

			ScoredPassage {
				id: passage.passage_id,
				q: passage.q,
				a: passage.a,
				chunk_index: passage.chunk_index,
				dataset_id: passage.dataset_id,
				collection_id: passage.collection_id,
				source_name: String::new(),
				source_id: None,
				source_link: None,
				scores: vec![ScoreEntry {
					kind: ScoreKind::Embedding,
					value: score,
					rank: rank as u32,
				}],
			}
			.with_collection(collection)
		})
		.collect();

	tracing::debug!(hit_count = hits.len(), "Embedding recall finished.");

	Ok(EmbeddingRecall { passages, tokens: embedding.tokens })
}
