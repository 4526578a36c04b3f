use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

pub const MAX_TERMS: usize = 32;

/// Splits a query into lowercase lexical terms.
///
/// Words come from Unicode word boundaries. Han, Kana and Hangul characters become one term each,
/// matching the `dataset_passages.full_text` column, which indexes every character in the ranges
/// of [`is_cjk`] as its own lexeme. Duplicates are dropped in order.
pub fn segment(query: &str) -> Vec<String> {
	let mut terms = Vec::new();
	let mut seen = HashSet::new();

	for word in query.unicode_words() {
		let mut run = String::new();

		for ch in word.chars().flat_map(char::to_lowercase) {
			if is_cjk(ch) {
				push_term(&mut terms, &mut seen, std::mem::take(&mut run));
				push_term(&mut terms, &mut seen, ch.to_string());
			} else if ch.is_alphanumeric() {
				run.push(ch);
			} else {
				push_term(&mut terms, &mut seen, std::mem::take(&mut run));
			}
		}

		push_term(&mut terms, &mut seen, run);

		if terms.len() >= MAX_TERMS {
			break;
		}
	}

	terms.truncate(MAX_TERMS);

	terms
}

/// Keep in sync with the character class in `sql/tables/002_dataset_passages.sql`.
pub fn is_cjk(ch: char) -> bool {
	matches!(
		ch,
		'\u{1100}'..='\u{11FF}'
			| '\u{3040}'..='\u{30FF}'
			| '\u{3130}'..='\u{318F}'
			| '\u{3400}'..='\u{4DBF}'
			| '\u{4E00}'..='\u{9FFF}'
			| '\u{AC00}'..='\u{D7AF}'
			| '\u{F900}'..='\u{FAFF}'
			| '\u{20000}'..='\u{2A6DF}'
	)
}

fn push_term(terms: &mut Vec<String>, seen: &mut HashSet<String>, term: String) {
	if !term.is_empty() && seen.insert(term.clone()) {
		terms.push(term);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_drops_punctuation() {
		assert_eq!(segment("How do REFUNDS work? refunds!"), vec!["how", "do", "refunds", "work"]);
	}

	#[test]
	fn splits_cjk_into_single_characters() {
		assert_eq!(segment("退款政策 v2"), vec!["退", "款", "政", "策", "v2"]);
		assert_eq!(segment("환불"), vec!["환", "불"]);
	}

	#[test]
	fn keeps_mixed_runs_apart() {
		assert_eq!(segment("iPhone退货"), vec!["iphone", "退", "货"]);
	}

	#[test]
	fn caps_the_term_count() {
		let query: Vec<String> = (0..50).map(|i| format!("term{i}")).collect();
		let terms = segment(&query.join(" "));

		assert_eq!(terms.len(), MAX_TERMS);
		assert_eq!(terms[0], "term0");
	}

	#[test]
	fn punctuation_only_yields_nothing() {
		assert!(segment("?!  ...").is_empty());
	}
}
