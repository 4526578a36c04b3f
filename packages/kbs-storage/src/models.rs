use uuid::Uuid;

/// A passage hydrated through the index fragments that matched a vector search.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Passage {
	pub passage_id: Uuid,
	pub dataset_id: Uuid,
	pub collection_id: Uuid,
	pub q: String,
	pub a: String,
	pub chunk_index: i32,
	pub index_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Collection {
	pub collection_id: Uuid,
	pub dataset_id: Uuid,
	pub name: String,
	pub source_id: Option<String>,
	pub source_link: Option<String>,
	pub forbid: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LexicalPassage {
	pub passage_id: Uuid,
	pub dataset_id: Uuid,
	pub collection_id: Uuid,
	pub q: String,
	pub a: String,
	pub chunk_index: i32,
	pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
	pub index_id: Uuid,
	pub score: f32,
}
