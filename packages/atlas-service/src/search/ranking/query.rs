use std::collections::HashSet;

use crate::search::QueryMode;
use atlas_domain::text;

pub fn resolve_mode(title_query: &str, content_query: &str) -> Option<QueryMode> {
	match (title_query.trim().is_empty(), content_query.trim().is_empty()) {
		(false, true) => Some(QueryMode::Title),
		(true, false) => Some(QueryMode::Content),
		(false, false) => Some(QueryMode::Both),
		(true, true) => None,
	}
}

/// The single pattern used for the initial store lookup.
pub fn retrieval_seed(mode: QueryMode, title_query: &str, content_query: &str) -> String {
	match mode {
		QueryMode::Title | QueryMode::Both => title_query.trim().to_string(),
		QueryMode::Content => text::seed_token(content_query),
	}
}

pub fn title_keywords(title_query: &str) -> Vec<String> {
	let words = text::words(title_query);

	if !words.is_empty() {
		return words;
	}

	let whole = text::normalize(title_query.trim());

	if whole.is_empty() { Vec::new() } else { vec![whole] }
}

/// Concatenates keyword lists, keeping the first occurrence of each keyword.
pub fn merge_keywords(primary: &[String], secondary: &[String]) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::with_capacity(primary.len() + secondary.len());

	for keyword in primary.iter().chain(secondary.iter()) {
		if seen.insert(keyword.as_str()) {
			out.push(keyword.clone());
		}
	}

	out
}
