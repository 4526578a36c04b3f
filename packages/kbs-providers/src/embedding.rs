use serde_json::Value;

use crate::{Error, Result};

/// One query vector plus the tokens the provider billed for encoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
	pub vector: Vec<f32>,
	pub tokens: u64,
}

pub async fn embed(
	cfg: &kbs_config::EmbeddingProviderConfig,
	model: &str,
	text: &str,
) -> Result<Embedding> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": model,
		"input": [text],
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;
	let embedding = parse_embedding_response(json)?;

	if embedding.vector.len() != cfg.dimensions as usize {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding dimension mismatch: expected {}, got {}.",
				cfg.dimensions,
				embedding.vector.len()
			),
		});
	}

	Ok(embedding)
}

fn parse_embedding_response(json: Value) -> Result<Embedding> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let item = data
		.iter()
		.enumerate()
		.min_by_key(|(fallback_index, item)| {
			item.get("index").and_then(|v| v.as_u64()).unwrap_or(*fallback_index as u64)
		})
		.map(|(_, item)| item)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Embedding response returned no vectors.".to_string(),
		})?;
	let values = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
	})?;
	let mut vector = Vec::with_capacity(values.len());

	for value in values {
		let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Embedding value must be numeric.".to_string(),
		})?;

		vector.push(number as f32);
	}

	let usage = json.get("usage");
	let tokens = usage
		.and_then(|u| u.get("total_tokens"))
		.or_else(|| usage.and_then(|u| u.get("prompt_tokens")))
		.and_then(|v| v.as_u64())
		.unwrap_or(0);

	Ok(Embedding { vector, tokens })
}
