pub mod search;

mod error;
mod store;

pub use error::{Error, Result};
pub use search::{
	RerankOutcome, ScoreEntry, ScoreKind, ScoredPassage, SearchMode, SearchRequest, SearchResponse,
	tokens::{EstimatedTokenCounter, TokenizerCounter},
};
pub use store::{PgLexicalIndex, PgPassageStore, QdrantVectorIndex};

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use kbs_config::{Config, EmbeddingProviderConfig, ProviderConfig};
use kbs_providers::{embedding, rerank};
use kbs_storage::{
	db::Db,
	models::{Collection, IndexHit, LexicalPassage, Passage},
	qdrant::QdrantStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, model: &'a str, text: &'a str) -> BoxFuture<'a, Result<QueryEmbedding>>;
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, query: VectorQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}

pub trait PassageStore
where
	Self: Send + Sync,
{
	fn forbidden_collections<'a>(
		&'a self,
		team_id: &'a str,
		dataset_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashSet<Uuid>>>;

	/// Resolves index fragment ids to the passages that own them.
	fn fetch_passages<'a>(&'a self, query: PassageQuery<'a>) -> BoxFuture<'a, Result<Vec<Passage>>>;

	fn fetch_collections<'a>(
		&'a self,
		team_id: &'a str,
		collection_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<Collection>>>;
}

pub trait LexicalIndex
where
	Self: Send + Sync,
{
	/// Returns hits ordered by descending relevance. Forbidden collections are not excluded here.
	fn search<'a>(
		&'a self,
		query: LexicalQuery<'a>,
	) -> BoxFuture<'a, Result<Vec<LexicalPassage>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		query: &'a str,
		docs: &'a [RerankDocument],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>>;
}

pub trait TokenCounter
where
	Self: Send + Sync,
{
	fn count(&self, text: &str) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryEmbedding {
	pub vector: Vec<f32>,
	pub tokens: u64,
}

pub struct VectorQuery<'a> {
	pub team_id: &'a str,
	pub dataset_ids: &'a [Uuid],
	pub vector: Vec<f32>,
	pub limit: u32,
	pub forbid: &'a HashSet<Uuid>,
}

pub struct PassageQuery<'a> {
	pub team_id: &'a str,
	pub dataset_ids: &'a [Uuid],
	pub forbid: &'a HashSet<Uuid>,
	pub index_ids: &'a [Uuid],
}

pub struct LexicalQuery<'a> {
	pub team_id: &'a str,
	pub dataset_id: Uuid,
	pub terms: &'a [String],
	pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankDocument {
	pub id: Uuid,
	pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankScore {
	pub id: Uuid,
	pub score: f32,
}

#[derive(Clone)]
pub struct Collaborators {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub vector_index: Arc<dyn VectorIndex>,
	pub passages: Arc<dyn PassageStore>,
	pub lexical: Arc<dyn LexicalIndex>,
	pub tokens: Arc<dyn TokenCounter>,
}

/// Whether a reranker exists for this process. Fixed at construction.
#[derive(Clone, Default)]
pub struct RerankCapability {
	provider: Option<Arc<dyn RerankProvider>>,
}
impl RerankCapability {
	pub fn new(provider: Arc<dyn RerankProvider>) -> Self {
		Self { provider: Some(provider) }
	}

	pub fn none() -> Self {
		Self::default()
	}

	pub fn from_config(cfg: Option<&ProviderConfig>) -> Self {
		match cfg {
			Some(cfg) => Self::new(Arc::new(HttpRerank::new(cfg.clone()))),
			None => Self::none(),
		}
	}

	pub fn is_available(&self) -> bool {
		self.provider.is_some()
	}

	pub(crate) fn provider(&self) -> Option<&Arc<dyn RerankProvider>> {
		self.provider.as_ref()
	}
}

pub struct KbsService {
	pub cfg: Config,
	pub collaborators: Collaborators,
	pub rerank: RerankCapability,
}
impl KbsService {
	/// Wires the HTTP providers and the Postgres/Qdrant adapters from `cfg`.
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Result<Self> {
		let tokens: Arc<dyn TokenCounter> = match cfg.tokenizer.repo.as_deref() {
			Some(repo) => Arc::new(TokenizerCounter::from_pretrained(repo)?),
			None => Arc::new(EstimatedTokenCounter),
		};
		let collaborators = Collaborators {
			embedding: Arc::new(HttpEmbedding::new(cfg.providers.embedding.clone())),
			vector_index: Arc::new(QdrantVectorIndex::new(Arc::new(qdrant))),
			passages: Arc::new(PgPassageStore::new(db.clone())),
			lexical: Arc::new(PgLexicalIndex::new(db, cfg.search.lexical_language.clone())),
			tokens,
		};
		let rerank = RerankCapability::from_config(cfg.providers.rerank.as_ref());

		Ok(Self { cfg, collaborators, rerank })
	}

	pub fn with_collaborators(
		cfg: Config,
		collaborators: Collaborators,
		rerank: RerankCapability,
	) -> Self {
		Self { cfg, collaborators, rerank }
	}
}

pub struct HttpEmbedding {
	cfg: EmbeddingProviderConfig,
}
impl HttpEmbedding {
	pub fn new(cfg: EmbeddingProviderConfig) -> Self {
		Self { cfg }
	}
}
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(&'a self, model: &'a str, text: &'a str) -> BoxFuture<'a, Result<QueryEmbedding>> {
		Box::pin(async move {
			let embedding::Embedding { vector, tokens } =
				embedding::embed(&self.cfg, model, text).await?;

			Ok(QueryEmbedding { vector, tokens })
		})
	}
}

pub struct HttpRerank {
	cfg: ProviderConfig,
}
impl HttpRerank {
	pub fn new(cfg: ProviderConfig) -> Self {
		Self { cfg }
	}
}
impl RerankProvider for HttpRerank {
	fn rerank<'a>(
		&'a self,
		query: &'a str,
		docs: &'a [RerankDocument],
	) -> BoxFuture<'a, Result<Vec<RerankScore>>> {
		Box::pin(async move {
			let texts: Vec<String> = docs.iter().map(|doc| doc.text.clone()).collect();
			let hits = rerank::rerank(&self.cfg, query, &texts).await?;

			Ok(hits
				.into_iter()
				.filter_map(|hit| {
					docs.get(hit.index).map(|doc| RerankScore { id: doc.id, score: hit.score })
				})
				.collect())
		})
	}
}
