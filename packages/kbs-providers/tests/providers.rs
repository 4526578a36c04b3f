use reqwest::header::{AUTHORIZATION, HeaderName};
use serde_json::{Map, Value};

#[test]
fn builds_bearer_auth_header() {
	let headers =
		kbs_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn merges_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-team".to_string(), Value::String("kb".to_string()));

	let headers =
		kbs_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");
	let value = headers.get(HeaderName::from_static("x-team")).expect("Missing x-team header.");

	assert_eq!(value, "kb");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = kbs_providers::auth_headers("secret", &defaults).expect_err("Expected error.");

	assert!(matches!(err, kbs_providers::Error::InvalidConfig { .. }));
}
