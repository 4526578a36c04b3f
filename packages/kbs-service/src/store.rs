use std::{collections::HashSet, sync::Arc};

use uuid::Uuid;

use kbs_storage::{
	db::Db,
	models::{Collection, IndexHit, LexicalPassage, Passage},
	qdrant::{DenseSearch, QdrantStore},
	queries::{self, LexicalSearch, PassagesByIndex},
};

use crate::{
	BoxFuture, Error, LexicalIndex, LexicalQuery, PassageQuery, PassageStore, Result, VectorIndex,
	VectorQuery,
};

pub struct QdrantVectorIndex {
	store: Arc<QdrantStore>,
}
impl QdrantVectorIndex {
	pub fn new(store: Arc<QdrantStore>) -> Self {
		Self { store }
	}
}
impl VectorIndex for QdrantVectorIndex {
	fn search<'a>(&'a self, query: VectorQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let VectorQuery { team_id, dataset_ids, vector, limit, forbid } = query;
			let hits = self
				.store
				.search_dense(DenseSearch {
					team_id,
					dataset_ids,
					forbid_collection_ids: forbid,
					vector,
					limit,
				})
				.await
				.map_err(|err| Error::VectorIndex { message: err.to_string() })?;

			Ok(hits)
		})
	}
}

pub struct PgPassageStore {
	db: Db,
}
impl PgPassageStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl PassageStore for PgPassageStore {
	fn forbidden_collections<'a>(
		&'a self,
		team_id: &'a str,
		dataset_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashSet<Uuid>>> {
		Box::pin(async move {
			let ids = queries::forbidden_collection_ids(&self.db.pool, team_id, dataset_ids)
				.await
				.map_err(storage_error)?;

			Ok(ids.into_iter().collect())
		})
	}

	fn fetch_passages<'a>(&'a self, query: PassageQuery<'a>) -> BoxFuture<'a, Result<Vec<Passage>>> {
		Box::pin(async move {
			let PassageQuery { team_id, dataset_ids, forbid, index_ids } = query;
			let mut forbid_collection_ids: Vec<Uuid> = forbid.iter().copied().collect();

			forbid_collection_ids.sort();

			queries::fetch_passages_by_index_ids(
				&self.db.pool,
				PassagesByIndex {
					team_id,
					dataset_ids,
					forbid_collection_ids: &forbid_collection_ids,
					index_ids,
				},
			)
			.await
			.map_err(storage_error)
		})
	}

	fn fetch_collections<'a>(
		&'a self,
		team_id: &'a str,
		collection_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Collection>>> {
		Box::pin(async move {
			queries::fetch_collections(&self.db.pool, team_id, collection_ids)
				.await
				.map_err(storage_error)
		})
	}
}

pub struct PgLexicalIndex {
	db: Db,
	text_search_config: String,
}
impl PgLexicalIndex {
	pub fn new(db: Db, text_search_config: String) -> Self {
		Self { db, text_search_config }
	}
}
impl LexicalIndex for PgLexicalIndex {
	fn search<'a>(
		&'a self,
		query: LexicalQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<LexicalPassage>>> {
		Box::pin(async move {
			let LexicalQuery { team_id, dataset_id, terms, limit } = query;

			queries::search_passages_full_text(
				&self.db.pool,
				LexicalSearch {
					text_search_config: &self.text_search_config,
					team_id,
					dataset_id,
					terms,
					limit,
				},
			)
			.await
			.map_err(|err| Error::Lexical { message: err.to_string() })
		})
	}
}

fn storage_error(err: kbs_storage::Error) -> Error {
	Error::Storage { message: err.to_string() }
}
