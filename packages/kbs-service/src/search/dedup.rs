use std::collections::HashSet;

use crate::search::ScoredPassage;

/// Drops passages whose normalized `q + a` text was already seen, keeping the earliest.
pub fn dedup_by_text(items: Vec<ScoredPassage>) -> Vec<ScoredPassage> {
	let mut seen = HashSet::new();

	items.into_iter().filter(|item| seen.insert(text_hash(&item.q, &item.a))).collect()
}

/// Hashes only the letters and digits of `q + a`.
pub fn text_hash(q: &str, a: &str) -> blake3::Hash {
	let mut hasher = blake3::Hasher::new();
	let mut buf = [0_u8; 4];

	for ch in q.chars().chain(a.chars()).filter(|ch| ch.is_alphanumeric()) {
		hasher.update(ch.encode_utf8(&mut buf).as_bytes());
	}

	hasher.finalize()
}
