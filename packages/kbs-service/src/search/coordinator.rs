use std::{
	collections::{HashMap, HashSet},
	panic,
	sync::Arc,
};

use tokio::task::JoinSet;
use uuid::Uuid;

use kbs_config::SearchFusion;
use kbs_storage::models::Collection;

use crate::{
	Collaborators, Error, Result,
	search::{
		RecallLimits, ScoredPassage,
		embedding_recall::{EmbeddingRecall, embedding_recall},
		full_text_recall::full_text_recall, fusion::reciprocal_rank_fusion,
	},
};

pub struct RecallScope {
	pub team_id: String,
	pub dataset_ids: Vec<Uuid>,
	pub model: String,
	pub limits: RecallLimits,
}

/// Read-only state shared by every recall task of one request.
pub struct RecallContext {
	pub collaborators: Collaborators,
	pub team_id: String,
	pub dataset_ids: Vec<Uuid>,
	pub model: String,
	pub limits: RecallLimits,
	pub forbid: HashSet<Uuid>,
}

#[derive(Debug, Default)]
pub struct FusedRecall {
	pub embedding: Vec<ScoredPassage>,
	pub full_text: Vec<ScoredPassage>,
	pub embedding_tokens: u64,
}

/// Recalls every query from both sources concurrently and fuses each source across queries.
///
/// Any failed recall fails the whole batch and aborts the tasks still running.
pub async fn recall(
	collaborators: &Collaborators,
	scope: RecallScope,
	queries: &[String],
	fusion: &SearchFusion,
) -> Result<FusedRecall> {
	let RecallScope { team_id, dataset_ids, model, limits } = scope;
	let forbid = collaborators.passages.forbidden_collections(&team_id, &dataset_ids).await?;

	tracing::debug!(forbidden_count = forbid.len(), "Loaded forbidden collections.");

	let ctx = Arc::new(RecallContext {
		collaborators: collaborators.clone(),
		team_id,
		dataset_ids,
		model,
		limits,
		forbid,
	});
	let mut tasks: JoinSet<Result<(usize, (EmbeddingRecall, Vec<ScoredPassage>))>> =
		JoinSet::new();

	for (position, query) in queries.iter().cloned().enumerate() {
		let ctx = Arc::clone(&ctx);

		tasks.spawn(async move {
			let (embedding, full_text) = tokio::try_join!(
				embedding_recall(&ctx, &query),
				full_text_recall(Arc::clone(&ctx), &query),
			)?;

			Ok((position, (embedding, full_text)))
		});
	}

	let per_query = join_ordered(tasks, queries.len()).await?;
	let mut embedding_lists = Vec::with_capacity(per_query.len());
	let mut full_text_lists = Vec::with_capacity(per_query.len());
	let mut embedding_tokens = 0_u64;

	for (embedding, full_text) in per_query {
		embedding_tokens = embedding_tokens.saturating_add(embedding.tokens);

		embedding_lists.push((fusion.embedding_k, embedding.passages));
		full_text_lists.push((fusion.full_text_k, full_text));
	}

	let mut embedding = reciprocal_rank_fusion(embedding_lists);
	let mut full_text = reciprocal_rank_fusion(full_text_lists);

	embedding.truncate(limits.embedding as usize);
	full_text.truncate(limits.full_text as usize);

	tracing::debug!(
		embedding_count = embedding.len(),
		full_text_count = full_text.len(),
		embedding_tokens,
		"Fused recall across queries."
	);

	Ok(FusedRecall { embedding, full_text, embedding_tokens })
}

/// Collects task results in spawn order. The first error drops the set, aborting the rest.
pub(crate) async fn join_ordered<T>(
	mut tasks: JoinSet<Result<(usize, T)>>,
	len: usize,
) -> Result<Vec<T>>
where
	T: Send + 'static,
{
	let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();

	while let Some(joined) = tasks.join_next().await {
		let (position, value) = match joined {
			Ok(result) => result?,
			Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
			Err(err) => {
				return Err(Error::Internal { message: format!("Recall task was cancelled: {err}.") });
			},
		};

		if let Some(slot) = slots.get_mut(position) {
			*slot = Some(value);
		}
	}

	Ok(slots.into_iter().flatten().collect())
}

pub(crate) async fn hydrate_collections(
	ctx: &RecallContext,
	collection_ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, Collection>> {
	let mut ids: Vec<Uuid> = collection_ids.collect::<HashSet<_>>().into_iter().collect();

	if ids.is_empty() {
		return Ok(HashMap::new());
	}

	ids.sort();

	let collections = ctx.collaborators.passages.fetch_collections(&ctx.team_id, &ids).await?;

	Ok(collections.into_iter().map(|collection| (collection.collection_id, collection)).collect())
}
