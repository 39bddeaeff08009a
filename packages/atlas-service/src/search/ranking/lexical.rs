use crate::search::ranking::ScoredCandidate;
use atlas_config::Ranking;
use atlas_domain::text;

/// Adds the keyword relevance score to every candidate.
///
/// Title, snippet and content occurrences are weighted separately and content occurrences
/// saturate at `content_hit_cap`. A candidate that hits every keyword of a multi-keyword set in
/// its title or content earns the AND-bonus.
pub fn score_lexical(candidates: &mut [ScoredCandidate], keywords: &[String], ranking: &Ranking) {
	for candidate in candidates.iter_mut() {
		let mut score = 0.0_f64;
		let mut all_hit = true;
		let mut matched = Vec::new();

		for keyword in keywords {
			let title_hits = text::count_occurrences(&candidate.title, keyword);
			let snippet_hits = text::count_occurrences(&candidate.snippet, keyword);
			let content_hits =
				text::count_occurrences(&candidate.content, keyword).min(ranking.content_hit_cap);

			score += f64::from(title_hits) * ranking.title_hit_weight
				+ f64::from(snippet_hits) * ranking.snippet_hit_weight
				+ f64::from(content_hits) * ranking.content_hit_weight;

			if title_hits == 0 && content_hits == 0 {
				all_hit = false;
			}
			if title_hits + snippet_hits + content_hits > 0 {
				matched.push(keyword.clone());
			}
		}

		if keywords.len() > 1 && all_hit {
			score += ranking.and_bonus;
		}

		candidate.lexical_score += score;
		candidate.has_keyword = !matched.is_empty();
		candidate.matched_keywords = matched;
	}
}

/// Drops candidates whose title contains none of `title_keywords`.
pub fn apply_title_filter(candidates: &mut Vec<ScoredCandidate>, title_keywords: &[String]) {
	candidates.retain(|candidate| passes_title_filter(candidate, title_keywords));
}

pub(super) fn passes_title_filter(candidate: &ScoredCandidate, title_keywords: &[String]) -> bool {
	title_keywords.iter().any(|keyword| candidate.title.contains(keyword.as_str()))
}
