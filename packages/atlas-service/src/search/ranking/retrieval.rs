use std::collections::HashSet;

use crate::search::ranking::{ScoredCandidate, lexical};
use atlas_domain::text;
use atlas_storage::models::Document;

/// Grows a thin candidate pool with documents from per-keyword lookups.
///
/// Existing candidates are kept as they are. New documents are de-duplicated by id, must carry
/// more than `min_content_chars` characters of content, and in combined mode must also pass
/// the title filter. They are admitted in order of how many keywords their title contains
/// until the pool holds `max_pool` candidates.
pub fn merge_expansion(
	existing: Vec<ScoredCandidate>,
	fetched: Vec<Document>,
	keywords: &[String],
	title_keywords: Option<&[String]>,
	min_content_chars: usize,
	max_pool: usize,
) -> Vec<ScoredCandidate> {
	let mut seen: HashSet<String> =
		existing.iter().map(|candidate| candidate.doc.id.clone()).collect();
	let mut additions = Vec::new();

	for doc in fetched {
		if !seen.insert(doc.id.clone()) {
			continue;
		}

		let candidate = ScoredCandidate::new(doc);

		if text::char_len(candidate.content.trim()) <= min_content_chars {
			continue;
		}
		if let Some(title_keywords) = title_keywords
			&& !lexical::passes_title_filter(&candidate, title_keywords)
		{
			continue;
		}

		let containment = title_containment(&candidate, keywords);

		additions.push((containment, candidate));
	}

	additions.sort_by(|(lhs_hits, lhs), (rhs_hits, rhs)| {
		rhs_hits
			.cmp(lhs_hits)
			.then_with(|| rhs.updated_at().cmp(&lhs.updated_at()))
			.then_with(|| lhs.doc.id.cmp(&rhs.doc.id))
	});

	let mut out = existing;

	for (_, candidate) in additions {
		if out.len() >= max_pool {
			break;
		}

		out.push(candidate);
	}

	out
}

fn title_containment(candidate: &ScoredCandidate, keywords: &[String]) -> usize {
	keywords.iter().filter(|keyword| candidate.title.contains(keyword.as_str())).count()
}
