use sqlx::PgPool;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Collection, LexicalPassage, Passage},
};

pub struct PassagesByIndex<'a> {
	pub team_id: &'a str,
	pub dataset_ids: &'a [Uuid],
	pub forbid_collection_ids: &'a [Uuid],
	pub index_ids: &'a [Uuid],
}

pub struct LexicalSearch<'a> {
	pub text_search_config: &'a str,
	pub team_id: &'a str,
	pub dataset_id: Uuid,
	pub terms: &'a [String],
	pub limit: u32,
}

pub async fn forbidden_collection_ids(
	pool: &PgPool,
	team_id: &str,
	dataset_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
	if dataset_ids.is_empty() {
		return Ok(Vec::new());
	}

	let ids = sqlx::query_scalar(
		"\
SELECT collection_id
FROM dataset_collections
WHERE team_id = $1
	AND dataset_id = ANY($2)
	AND forbid",
	)
	.bind(team_id)
	.bind(dataset_ids)
	.fetch_all(pool)
	.await?;

	Ok(ids)
}

pub async fn fetch_passages_by_index_ids(
	pool: &PgPool,
	args: PassagesByIndex<'_>,
) -> Result<Vec<Passage>> {
	let PassagesByIndex { team_id, dataset_ids, forbid_collection_ids, index_ids } = args;

	if index_ids.is_empty() || dataset_ids.is_empty() {
		return Ok(Vec::new());
	}

	let passages = sqlx::query_as::<_, Passage>(
		"\
SELECT
	p.passage_id,
	p.dataset_id,
	p.collection_id,
	p.q,
	p.a,
	p.chunk_index,
	array_agg(i.index_id ORDER BY i.index_id) AS index_ids
FROM dataset_passages p
JOIN dataset_passage_indexes i ON i.passage_id = p.passage_id
WHERE p.team_id = $1
	AND p.dataset_id = ANY($2)
	AND NOT (p.collection_id = ANY($3))
	AND i.index_id = ANY($4)
GROUP BY p.passage_id",
	)
	.bind(team_id)
	.bind(dataset_ids)
	.bind(forbid_collection_ids)
	.bind(index_ids)
	.fetch_all(pool)
	.await?;

	Ok(passages)
}

pub async fn fetch_collections(
	pool: &PgPool,
	team_id: &str,
	collection_ids: &[Uuid],
) -> Result<Vec<Collection>> {
	if collection_ids.is_empty() {
		return Ok(Vec::new());
	}

	let collections = sqlx::query_as::<_, Collection>(
		"\
SELECT collection_id, dataset_id, name, source_id, source_link, forbid
FROM dataset_collections
WHERE team_id = $1 AND collection_id = ANY($2)",
	)
	.bind(team_id)
	.bind(collection_ids)
	.fetch_all(pool)
	.await?;

	Ok(collections)
}

/// Ranks one dataset's passages against an OR of the given terms. Forbidden collections are not
/// excluded here; callers filter the returned `collection_id`s.
pub async fn search_passages_full_text(
	pool: &PgPool,
	args: LexicalSearch<'_>,
) -> Result<Vec<LexicalPassage>> {
	let LexicalSearch { text_search_config, team_id, dataset_id, terms, limit } = args;

	if terms.is_empty() || limit == 0 {
		return Ok(Vec::new());
	}
	if terms.iter().any(|term| term.is_empty() || !term.chars().all(char::is_alphanumeric)) {
		return Err(Error::InvalidArgument(
			"Lexical terms must be non-empty and alphanumeric.".to_string(),
		));
	}

	let tsquery = terms.join(" | ");
	let passages = sqlx::query_as::<_, LexicalPassage>(
		"\
SELECT
	p.passage_id,
	p.dataset_id,
	p.collection_id,
	p.q,
	p.a,
	p.chunk_index,
	ts_rank_cd(p.full_text, query)::real AS score
FROM dataset_passages p, to_tsquery($1::text::regconfig, $2) query
WHERE p.team_id = $3
	AND p.dataset_id = $4
	AND p.full_text @@ query
ORDER BY score DESC, p.passage_id
LIMIT $5",
	)
	.bind(text_search_config)
	.bind(tsquery)
	.bind(team_id)
	.bind(dataset_id)
	.bind(i64::from(limit))
	.fetch_all(pool)
	.await?;

	Ok(passages)
}
