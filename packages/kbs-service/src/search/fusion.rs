//! Reciprocal rank fusion over passage lists.

use std::collections::HashMap;

use uuid::Uuid;

use crate::search::ScoredPassage;

/// Merges ranked lists by passage id.
///
/// Each item at 0-based rank `r` of a list with constant `k` contributes `1 / (k + r + 1)`. Merged
/// items keep the fields of their first occurrence and accumulate every list's score entries.
/// The result is sorted by fused score, descending; ties keep first-seen order.
pub fn reciprocal_rank_fusion(lists: Vec<(f32, Vec<ScoredPassage>)>) -> Vec<ScoredPassage> {
	let mut merged: Vec<(ScoredPassage, f64)> = Vec::new();
	let mut positions: HashMap<Uuid, usize> = HashMap::new();

	for (k, list) in lists {
		for (rank, item) in list.into_iter().enumerate() {
			let contribution = 1.0 / (f64::from(k) + rank as f64 + 1.0);

			match positions.get(&item.id) {
				Some(&position) => {
					let (existing, score) = &mut merged[position];

					*score += contribution;
					existing.scores.extend(item.scores);
				},
				None => {
					positions.insert(item.id, merged.len());
					merged.push((item, contribution));
				},
			}
		}
	}

	merged.sort_by(|(_, a), (_, b)| b.total_cmp(a));

	merged.into_iter().map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::search::{ScoreEntry, ScoreKind};

	fn passage(id: u128, kind: ScoreKind, rank: u32) -> ScoredPassage {
		ScoredPassage {
			id: Uuid::from_u128(id),
			q: format!("question {id}"),
			a: format!("answer {id}"),
			chunk_index: 0,
			dataset_id: Uuid::nil(),
			collection_id: Uuid::nil(),
			source_name: String::new(),
			source_id: None,
			source_link: None,
			scores: vec![ScoreEntry { kind, value: 1.0, rank }],
		}
	}

	fn ids(items: &[ScoredPassage]) -> Vec<u128> {
		items.iter().map(|item| item.id.as_u128()).collect()
	}

	#[test]
	fn single_list_keeps_its_order() {
		let list: Vec<_> = [5, 3, 9, 1]
			.into_iter()
			.enumerate()
			.map(|(rank, id)| passage(id, ScoreKind::Embedding, rank as u32))
			.collect();
		let fused = reciprocal_rank_fusion(vec![(60.0, list)]);

		assert_eq!(ids(&fused), vec![5, 3, 9, 1]);
	}

	#[test]
	fn ties_break_by_first_seen_list() {
		let a = vec![passage(1, ScoreKind::Embedding, 0)];
		let b = vec![passage(2, ScoreKind::FullText, 0)];
		let fused = reciprocal_rank_fusion(vec![(60.0, a), (60.0, b)]);

		assert_eq!(ids(&fused), vec![1, 2]);
	}

	#[test]
	fn items_in_several_lists_rise_and_keep_all_entries() {
		let embedding =
			vec![passage(1, ScoreKind::Embedding, 0), passage(2, ScoreKind::Embedding, 1)];
		let full_text =
			vec![passage(3, ScoreKind::FullText, 0), passage(2, ScoreKind::FullText, 1)];
		let fused = reciprocal_rank_fusion(vec![(60.0, embedding), (60.0, full_text)]);

		assert_eq!(ids(&fused), vec![2, 1, 3]);

		let kinds: Vec<_> = fused[0].scores.iter().map(|entry| entry.kind).collect();

		assert_eq!(kinds, vec![ScoreKind::Embedding, ScoreKind::FullText]);
	}

	#[test]
	fn smaller_k_weighs_top_ranks_more() {
		let rerank = vec![passage(2, ScoreKind::ReRank, 0)];
		let embedding = vec![passage(1, ScoreKind::Embedding, 0)];
		let fused = reciprocal_rank_fusion(vec![(60.0, embedding), (58.0, rerank)]);

		assert_eq!(ids(&fused), vec![2, 1]);
	}

	#[test]
	fn empty_input_yields_empty_output() {
		assert!(reciprocal_rank_fusion(Vec::new()).is_empty());
		assert!(reciprocal_rank_fusion(vec![(60.0, Vec::new())]).is_empty());
	}
}
