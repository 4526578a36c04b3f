mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Postgres, ProviderConfig, Providers, Qdrant, Search,
	SearchFusion, Service, Storage, Tokenizer,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	let mut keys = vec![("embedding", &cfg.providers.embedding.api_key)];

	if let Some(rerank) = cfg.providers.rerank.as_ref() {
		keys.push(("rerank", &rerank.api_key));
	}

	for (label, key) in keys {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	let search = &cfg.search;

	if search.default_token_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_token_limit must be greater than zero.".to_string(),
		});
	}
	if search.max_token_limit < search.default_token_limit {
		return Err(Error::Validation {
			message: "search.max_token_limit must be at least search.default_token_limit."
				.to_string(),
		});
	}
	if search.max_queries == 0 {
		return Err(Error::Validation {
			message: "search.max_queries must be greater than zero.".to_string(),
		});
	}
	if search.lexical_language.is_empty()
		|| !search.lexical_language.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
	{
		return Err(Error::Validation {
			message: "search.lexical_language must be a bare text search configuration name."
				.to_string(),
		});
	}

	for (label, k) in [
		("search.fusion.embedding_k", search.fusion.embedding_k),
		("search.fusion.full_text_k", search.fusion.full_text_k),
		("search.fusion.rerank_k", search.fusion.rerank_k),
	] {
		if !k.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if k < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.tokenizer.repo.as_deref().map(|repo| repo.trim().is_empty()).unwrap_or(false) {
		cfg.tokenizer.repo = None;
	}
	if cfg.providers.rerank.as_ref().map(|rerank| rerank.model.trim().is_empty()).unwrap_or(false)
	{
		cfg.providers.rerank = None;
	}

	cfg.search.lexical_language = cfg.search.lexical_language.trim().to_string();
}
