use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub tokenizer: Tokenizer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Optional. When absent the service runs without a reranker and every rerank request is
	/// silently downgraded.
	pub rerank: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_token_limit: u32,
	pub max_token_limit: u32,
	/// Tokens allowed past the requested limit before an item is cut off outright.
	pub token_overflow_margin: u32,
	pub max_queries: u32,
	/// Postgres text search configuration used by both the index column and the query.
	pub lexical_language: String,
	pub fusion: SearchFusion,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_token_limit: 1_500,
			max_token_limit: 20_000,
			token_overflow_margin: 500,
			max_queries: 8,
			lexical_language: "simple".to_string(),
			fusion: SearchFusion::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchFusion {
	pub embedding_k: f32,
	pub full_text_k: f32,
	pub rerank_k: f32,
}
impl Default for SearchFusion {
	fn default() -> Self {
		Self { embedding_k: 60.0, full_text_k: 60.0, rerank_k: 58.0 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tokenizer {
	/// Hugging Face repo holding a `tokenizer.json`. Without it token counts are estimated.
	pub repo: Option<String>,
}
