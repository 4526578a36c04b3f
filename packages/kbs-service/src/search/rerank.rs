use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
	RerankDocument, RerankProvider, RerankScore,
	search::{ScoreEntry, ScoreKind, ScoredPassage},
};

/// What the rerank stage did for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RerankOutcome {
	/// Candidates in the reranker's order, each carrying only its `reRank` entry.
	Applied(Vec<ScoredPassage>),
	/// Not requested, or no reranker is configured.
	Skipped,
	/// Requested but unusable for this request. The search continues without it.
	Degraded { reason: String },
}
impl RerankOutcome {
	pub fn is_applied(&self) -> bool {
		matches!(self, Self::Applied(_))
	}

	pub fn into_passages(self) -> Vec<ScoredPassage> {
		match self {
			Self::Applied(passages) => passages,
			Self::Skipped | Self::Degraded { .. } => Vec::new(),
		}
	}
}

/// Scores `candidates` with the reranker. Provider failures degrade instead of failing.
pub async fn rerank_stage(
	provider: Option<&Arc<dyn RerankProvider>>,
	query: &str,
	candidates: &[ScoredPassage],
) -> RerankOutcome {
	let Some(provider) = provider else {
		return RerankOutcome::Skipped;
	};

	if candidates.is_empty() {
		tracing::debug!("No rerank candidates.");

		return RerankOutcome::Degraded { reason: "No candidates to rerank.".to_string() };
	}

	let documents: Vec<RerankDocument> = candidates
		.iter()
		.map(|candidate| RerankDocument { id: candidate.id, text: candidate.text() })
		.collect();
	let scores = match provider.rerank(query, &documents).await {
		Ok(scores) => scores,
		Err(err) => {
			tracing::warn!(error = %err, "Rerank failed. Continuing without rerank.");

			return RerankOutcome::Degraded { reason: err.to_string() };
		},
	};

	if scores.is_empty() {
		tracing::warn!(
			candidate_count = candidates.len(),
			"Reranker returned no scores. Continuing without rerank."
		);

		return RerankOutcome::Degraded { reason: "Reranker returned no scores.".to_string() };
	}

	let by_id: HashMap<Uuid, &ScoredPassage> =
		candidates.iter().map(|candidate| (candidate.id, candidate)).collect();
	let mut reranked = Vec::with_capacity(scores.len());

	for (rank, RerankScore { id, score }) in scores.into_iter().enumerate() {
		let Some(candidate) = by_id.get(&id) else {
			tracing::warn!(passage_id = %id, "Reranker returned an unknown passage id.");

			continue;
		};

		reranked.push(ScoredPassage {
			scores: vec![ScoreEntry { kind: ScoreKind::ReRank, value: score, rank: rank as u32 }],
			..(*candidate).clone()
		});
	}

	if reranked.is_empty() {
		return RerankOutcome::Degraded {
			reason: "Reranker returned no known passages.".to_string(),
		};
	}

	tracing::debug!(reranked_count = reranked.len(), "Rerank applied.");

	RerankOutcome::Applied(reranked)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{BoxFuture, Error, Result};

	enum Reply {
		Scores(Vec<RerankScore>),
		Fail,
	}

	struct StaticRerank(Reply);
	impl RerankProvider for StaticRerank {
		fn rerank<'a>(
			&'a self,
			_query: &'a str,
			_docs: &'a [RerankDocument],
		) -> BoxFuture<'a, Result<Vec<RerankScore>>> {
			let reply = match &self.0 {
				Reply::Scores(scores) => Ok(scores.clone()),
				Reply::Fail => Err(Error::Provider { message: "reranker unavailable".to_string() }),
			};

			Box::pin(async move { reply })
		}
	}

	fn candidate(id: u128) -> ScoredPassage {
		ScoredPassage {
			id: Uuid::from_u128(id),
			q: format!("q{id}"),
			a: format!("a{id}"),
			chunk_index: 0,
			dataset_id: Uuid::nil(),
			collection_id: Uuid::nil(),
			source_name: String::new(),
			source_id: None,
			source_link: None,
			scores: vec![ScoreEntry { kind: ScoreKind::Embedding, value: 0.5, rank: 0 }],
		}
	}

	fn provider(reply: Reply) -> Arc<dyn RerankProvider> {
		Arc::new(StaticRerank(reply))
	}

	#[tokio::test]
	async fn skipped_without_provider() {
		let outcome = rerank_stage(None, "q", &[candidate(1)]).await;

		assert_eq!(outcome, RerankOutcome::Skipped);
	}

	#[tokio::test]
	async fn provider_error_degrades() {
		let provider = provider(Reply::Fail);
		let outcome = rerank_stage(Some(&provider), "q", &[candidate(1)]).await;

		assert!(matches!(outcome, RerankOutcome::Degraded { .. }));
		assert!(outcome.into_passages().is_empty());
	}

	#[tokio::test]
	async fn empty_scores_degrade() {
		let provider = provider(Reply::Scores(Vec::new()));
		let outcome = rerank_stage(Some(&provider), "q", &[candidate(1)]).await;

		assert!(matches!(outcome, RerankOutcome::Degraded { .. }));
	}

	#[tokio::test]
	async fn follows_reranker_order_and_drops_unknown_ids() {
		let provider = provider(Reply::Scores(vec![
			RerankScore { id: Uuid::from_u128(2), score: 0.9 },
			RerankScore { id: Uuid::from_u128(99), score: 0.8 },
			RerankScore { id: Uuid::from_u128(1), score: 0.1 },
		]));
		let outcome = rerank_stage(Some(&provider), "q", &[candidate(1), candidate(2)]).await;
		let RerankOutcome::Applied(items) = outcome else {
			panic!("expected rerank to apply");
		};
		let ids: Vec<_> = items.iter().map(|item| item.id.as_u128()).collect();

		assert_eq!(ids, vec![2, 1]);
		assert_eq!(
			items[0].scores,
			vec![ScoreEntry { kind: ScoreKind::ReRank, value: 0.9, rank: 0 }]
		);
		assert_eq!(items[1].scores[0].rank, 2);
	}
}
