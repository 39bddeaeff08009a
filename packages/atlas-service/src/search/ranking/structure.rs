use std::collections::HashSet;

use serde_json::Value;

use atlas_domain::{lexicon, text};

const FALLBACK_MIN_CHARS: usize = 3;
const FALLBACK_MAX_TOKENS: usize = 3;
const PREFIX_CHARS: usize = 3;
const PREFIX_MIN_CHARS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredQuery {
	pub keywords: Vec<String>,
	pub title_must: Vec<String>,
	pub content_must: Vec<String>,
	pub intent: Option<String>,
}

/// Short keyword-style queries skip the provider entirely.
pub fn is_simple_query(query: &str) -> bool {
	text::whitespace_token_count(query) <= 2 && !lexicon::contains_connector(query)
}

pub fn heuristic_structure(query: &str, max_keywords: usize) -> StructuredQuery {
	let keywords = harden_keywords(text::words(query), query);

	StructuredQuery { keywords: expand_keywords(keywords, max_keywords), ..Default::default() }
}

/// Keywords derived from the raw query alone, used when the provider is absent or failed.
pub fn fallback_structure(query: &str, max_keywords: usize) -> StructuredQuery {
	let keywords = harden_keywords(raw_keywords(query), query);

	StructuredQuery { keywords: expand_keywords(keywords, max_keywords), ..Default::default() }
}

/// Interprets provider output. Returns `None` when `raw` is not a JSON object.
///
/// Accepts both `title_must` and `titleMust` spellings, and keyword lists given either as
/// arrays or as comma-separated strings.
pub fn provider_structure(raw: &Value, query: &str, max_keywords: usize) -> Option<StructuredQuery> {
	let object = raw.as_object()?;
	let provided = string_list(object.get("keywords"));
	let merged = provided.into_iter().chain(raw_keywords(query));
	let keywords = expand_keywords(harden_keywords(merged, query), max_keywords);
	let title_must =
		normalize_terms(string_list(object.get("title_must").or_else(|| object.get("titleMust"))));
	let content_must = normalize_terms(string_list(
		object.get("content_must").or_else(|| object.get("contentMust")),
	));
	let intent = object
		.get("intent")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|intent| !intent.is_empty())
		.map(str::to_string);

	Some(StructuredQuery { keywords, title_must, content_must, intent })
}

/// Keywords pulled straight from the query text, stop phrases and stopwords removed.
pub fn raw_keywords(query: &str) -> Vec<String> {
	let stripped = lexicon::strip_stop_phrases(query);
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for fragment in text::split_keyword(&stripped) {
		if lexicon::is_stopword(&fragment) {
			continue;
		}
		if seen.insert(fragment.clone()) {
			out.push(fragment);
		}
	}

	out
}

/// Re-splits, filters and de-duplicates candidate keywords.
///
/// Never returns an empty list for a non-empty query: it falls back to the first few longer
/// query tokens and, failing that, to the whole normalized query.
pub fn harden_keywords<I>(candidates: I, query: &str) -> Vec<String>
where
	I: IntoIterator<Item = String>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for candidate in candidates {
		for fragment in text::split_keyword(&candidate) {
			if lexicon::is_stopword(&fragment) {
				continue;
			}
			if seen.insert(fragment.clone()) {
				out.push(fragment);
			}
		}
	}

	if !out.is_empty() {
		return out;
	}

	out = text::words(query)
		.into_iter()
		.filter(|word| text::char_len(word) >= FALLBACK_MIN_CHARS)
		.take(FALLBACK_MAX_TOKENS)
		.collect();

	if out.is_empty() {
		let whole = text::normalize(query.trim());

		if !whole.is_empty() {
			out.push(whole);
		}
	}

	out
}

/// Appends three-character prefixes of longer keywords, then caps the list.
///
/// Original keywords always come first, so the cap only ever drops prefixes or trailing
/// keywords.
pub fn expand_keywords(keywords: Vec<String>, max_keywords: usize) -> Vec<String> {
	let mut out = keywords.clone();

	for keyword in &keywords {
		if let Some(prefix) = text::char_prefix(keyword, PREFIX_CHARS, PREFIX_MIN_CHARS)
			&& !out.contains(&prefix)
		{
			out.push(prefix);
		}
	}

	out.truncate(max_keywords);

	out
}

fn string_list(value: Option<&Value>) -> Vec<String> {
	match value {
		Some(Value::String(raw)) => raw.split(',').map(str::to_string).collect(),
		Some(Value::Array(items)) =>
			items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
		_ => Vec::new(),
	}
}

fn normalize_terms(terms: Vec<String>) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for term in terms {
		let normalized = text::normalize(term.trim());

		if normalized.is_empty() {
			continue;
		}
		if seen.insert(normalized.clone()) {
			out.push(normalized);
		}
	}

	out
}
