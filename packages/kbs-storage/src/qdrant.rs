pub const DENSE_VECTOR_NAME: &str = "dense";

use std::collections::HashSet;

use qdrant_client::qdrant::{
	Condition, CreateCollectionBuilder, Distance, Filter, PointId, Query, QueryPointsBuilder,
	VectorParamsBuilder, VectorsConfigBuilder, point_id::PointIdOptions,
};
use uuid::Uuid;

use crate::{Result, models::IndexHit};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}

/// Points are index fragments keyed by `index_id`, with `team_id`, `dataset_id`, `collection_id`
/// and `passage_id` stored as keyword payload.
pub struct DenseSearch<'a> {
	pub team_id: &'a str,
	pub dataset_ids: &'a [Uuid],
	pub forbid_collection_ids: &'a HashSet<Uuid>,
	pub vector: Vec<f32>,
	pub limit: u32,
}

impl QdrantStore {
	pub fn new(cfg: &kbs_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config),
			)
			.await?;

		tracing::info!(collection = %self.collection, "Created Qdrant collection.");

		Ok(())
	}

	pub async fn search_dense(&self, args: DenseSearch<'_>) -> Result<Vec<IndexHit>> {
		let DenseSearch { team_id, dataset_ids, forbid_collection_ids, vector, limit } = args;

		if limit == 0 || dataset_ids.is_empty() {
			return Ok(Vec::new());
		}

		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.filter(scope_filter(team_id, dataset_ids, forbid_collection_ids))
			.limit(u64::from(limit));
		let response = self.client.query(search).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(index_id) = point.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!("Vector hit is missing a UUID point id.");

				continue;
			};

			hits.push(IndexHit { index_id, score: point.score });
		}

		Ok(hits)
	}
}

pub fn scope_filter(
	team_id: &str,
	dataset_ids: &[Uuid],
	forbid_collection_ids: &HashSet<Uuid>,
) -> Filter {
	let datasets: Vec<String> = dataset_ids.iter().map(Uuid::to_string).collect();
	let mut must_not = Vec::new();

	if !forbid_collection_ids.is_empty() {
		let mut forbidden: Vec<String> =
			forbid_collection_ids.iter().map(Uuid::to_string).collect();

		forbidden.sort();
		must_not.push(Condition::matches("collection_id", forbidden));
	}

	Filter {
		must: vec![
			Condition::matches("team_id", team_id.to_string()),
			Condition::matches("dataset_id", datasets),
		],
		should: Vec::new(),
		must_not,
		min_should: None,
	}
}

pub fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scope_filter_skips_empty_forbid_set() {
		let filter = scope_filter("team", &[Uuid::new_v4()], &HashSet::new());

		assert_eq!(filter.must.len(), 2);
		assert!(filter.must_not.is_empty());
	}

	#[test]
	fn scope_filter_excludes_forbidden_collections() {
		let forbid = HashSet::from([Uuid::new_v4(), Uuid::new_v4()]);
		let filter = scope_filter("team", &[Uuid::new_v4()], &forbid);

		assert_eq!(filter.must_not.len(), 1);
	}

	#[test]
	fn parses_uuid_point_ids_only() {
		let id = Uuid::new_v4();

		assert_eq!(point_id_to_uuid(&PointId::from(id.to_string())), Some(id));
		assert_eq!(point_id_to_uuid(&PointId::from(7_u64)), None);
	}
}
