use crate::search::ranking::ScoredCandidate;
use atlas_config::{Ranking, RankingPriority};
use atlas_storage::models::Document;

pub fn priority_score(doc: &Document, priority: &RankingPriority, bonus: f64) -> f64 {
	let kind = doc.kind.to_lowercase();
	let source = doc.source.to_lowercase();
	let rich_kind = priority.rich_kinds.iter().any(|fragment| kind.contains(fragment.as_str()));
	let structured_source = priority.structured_sources.iter().any(|label| *label == source);

	if rich_kind || structured_source { bonus } else { 0.0 }
}

/// Sets the source-type priority and the combined total on every candidate.
pub fn finalize_scores(candidates: &mut [ScoredCandidate], ranking: &Ranking) {
	for candidate in candidates.iter_mut() {
		candidate.priority_score =
			priority_score(&candidate.doc, &ranking.priority, ranking.priority_bonus);
		candidate.total_score = candidate.priority_score
			+ candidate.lexical_score
			+ candidate.semantic_score * ranking.semantic_scale;
	}
}

/// Keeps candidates whose title holds every `title_must` term and whose content or snippet
/// holds every `content_must` term.
pub fn apply_must_filters(
	candidates: &mut Vec<ScoredCandidate>,
	title_must: &[String],
	content_must: &[String],
) {
	if title_must.is_empty() && content_must.is_empty() {
		return;
	}

	candidates.retain(|candidate| {
		title_must.iter().all(|term| candidate.title.contains(term.as_str()))
			&& content_must.iter().all(|term| {
				let term = term.as_str();

				candidate.content.contains(term) || candidate.snippet.contains(term)
			})
	});
}

/// Orders by total score, then most recently updated, then id.
pub fn sort_candidates(candidates: &mut [ScoredCandidate]) {
	candidates.sort_by(|lhs, rhs| {
		rhs.total_score
			.total_cmp(&lhs.total_score)
			.then_with(|| rhs.updated_at().cmp(&lhs.updated_at()))
			.then_with(|| lhs.doc.id.cmp(&rhs.doc.id))
	});
}

pub fn paginate(
	candidates: Vec<ScoredCandidate>,
	offset: usize,
	limit: usize,
) -> Vec<ScoredCandidate> {
	candidates.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
	use time::{Duration, macros::datetime};

	use super::*;

	fn candidate(id: &str, source: &str, kind: &str, minutes: i64) -> ScoredCandidate {
		ScoredCandidate::new(Document {
			id: id.to_string(),
			source: source.to_string(),
			title: format!("Title {id}"),
			snippet: String::new(),
			content: Some(format!("Content for {id}")),
			path: String::new(),
			kind: kind.to_string(),
			updated_at: datetime!(2024-01-01 00:00 UTC) + Duration::minutes(minutes),
		})
	}

	#[test]
	fn rich_kinds_and_structured_sources_get_priority() {
		let priority = RankingPriority::default();
		let sheet = candidate(
			"a",
			"drive",
			"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
			0,
		);
		let issue = candidate("b", "Tracker", "text/plain", 0);
		let plain = candidate("c", "drive", "text/plain", 0);

		assert_eq!(priority_score(&sheet.doc, &priority, 1e6), 1e6);
		assert_eq!(priority_score(&issue.doc, &priority, 1e6), 1e6);
		assert_eq!(priority_score(&plain.doc, &priority, 1e6), 0.0);
	}

	#[test]
	fn total_combines_priority_lexical_and_scaled_semantic() {
		let mut candidates = vec![candidate("a", "design-tool", "", 0)];

		candidates[0].lexical_score = 5_000.0;
		candidates[0].semantic_score = 0.5;

		finalize_scores(&mut candidates, &Ranking::default());

		assert_eq!(candidates[0].total_score, 1_000_000.0 + 5_000.0 + 50.0);
	}

	#[test]
	fn ties_break_on_recency_then_id() {
		let mut candidates = vec![
			candidate("b", "drive", "", 0),
			candidate("a", "drive", "", 0),
			candidate("c", "drive", "", 5),
		];

		sort_candidates(&mut candidates);

		let ids = candidates.iter().map(|c| c.doc.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, vec!["c", "a", "b"]);
	}

	#[test]
	fn must_filters_are_conjunctive() {
		let mut candidates = vec![candidate("a", "drive", "", 0), candidate("b", "drive", "", 0)];

		candidates[1].snippet = "approved".to_string();

		apply_must_filters(&mut candidates, &["title".to_string()], &["approved".to_string()]);

		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].doc.id, "b");
	}

	#[test]
	fn pagination_skips_and_takes() {
		let candidates = (0..5).map(|i| candidate(&i.to_string(), "drive", "", i)).collect();
		let page = paginate(candidates, 2, 2);

		assert_eq!(page.len(), 2);
		assert_eq!(page[0].doc.id, "2");
	}
}
