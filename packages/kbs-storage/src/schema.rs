use crate::{Error, Result};

pub fn render_schema(text_search_config: &str) -> Result<String> {
	if text_search_config.is_empty()
		|| !text_search_config.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
	{
		return Err(Error::InvalidArgument(format!(
			"Text search configuration {text_search_config:?} is not a bare identifier."
		)));
	}

	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	Ok(expanded.replace("<TEXT_SEARCH_CONFIG>", text_search_config))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_dataset_collections.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_dataset_collections.sql")),
				"tables/002_dataset_passages.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_dataset_passages.sql")),
				"tables/003_dataset_passage_indexes.sql" => out
					.push_str(include_str!("../../../sql/tables/003_dataset_passage_indexes.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
