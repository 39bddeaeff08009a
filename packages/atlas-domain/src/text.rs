use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

static KEYWORD_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"[\s\p{P}\p{S}]+").expect("Keyword separator pattern must compile.")
});

/// NFC-normalizes and lowercases `input`.
///
/// Every comparison the ranker performs goes through this function so that composed and
/// decomposed Hangul (or accented Latin) compare equal.
pub fn normalize(input: &str) -> String {
	input.nfc().collect::<String>().to_lowercase()
}

/// Counts non-overlapping literal occurrences of `needle` in `haystack`.
///
/// Both sides are expected to be normalized already.
pub fn count_occurrences(haystack: &str, needle: &str) -> u32 {
	if needle.is_empty() || haystack.len() < needle.len() {
		return 0;
	}

	haystack.matches(needle).count().try_into().unwrap_or(u32::MAX)
}

/// Normalized word tokens in first-seen order, without duplicates.
pub fn words(input: &str) -> Vec<String> {
	let normalized = normalize(input);
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for word in normalized.unicode_words() {
		if seen.insert(word) {
			out.push(word.to_string());
		}
	}

	out
}

/// Splits on whitespace, punctuation and symbols. Empty fragments are dropped.
pub fn split_keyword(input: &str) -> Vec<String> {
	KEYWORD_SEPARATOR
		.split(input)
		.map(str::trim)
		.filter(|fragment| !fragment.is_empty())
		.map(normalize)
		.collect()
}

pub fn whitespace_token_count(input: &str) -> usize {
	input.split_whitespace().count()
}

pub fn char_len(input: &str) -> usize {
	input.chars().count()
}

/// Returns the longest prefix of `input` holding at most `max_chars` characters.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
	match input.char_indices().nth(max_chars) {
		Some((byte_idx, _)) => &input[..byte_idx],
		None => input,
	}
}

/// The first `n` characters of `input`, or `None` when it is shorter than `min_chars`.
pub fn char_prefix(input: &str, n: usize, min_chars: usize) -> Option<String> {
	if char_len(input) < min_chars {
		return None;
	}

	Some(input.chars().take(n).collect())
}

/// Picks the store lookup seed for a content-only query.
///
/// The first word of at least two characters wins; otherwise the trimmed query is used as-is.
pub fn seed_token(query: &str) -> String {
	let normalized = normalize(query);

	for word in normalized.unicode_words() {
		if char_len(word) >= 2 {
			return word.to_string();
		}
	}

	normalized.trim().to_string()
}

pub fn is_hangul(ch: char) -> bool {
	matches!(
		ch,
		'\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'
	)
}

pub fn contains_hangul(input: &str) -> bool {
	input.chars().any(is_hangul)
}

#[cfg(test)]
mod tests {
	use crate::text;

	#[test]
	fn normalize_composes_decomposed_hangul() {
		let decomposed = "\u{1105}\u{1169}\u{1103}\u{1173}\u{1106}\u{1162}\u{11B8}";

		assert_eq!(text::normalize(decomposed), "로드맵");
		assert_eq!(text::normalize("Roadmap Q3"), "roadmap q3");
	}

	#[test]
	fn counts_literal_non_overlapping_occurrences() {
		assert_eq!(text::count_occurrences("로드맵 로드맵 초안", "로드맵"), 2);
		assert_eq!(text::count_occurrences("aaaa", "aa"), 2);
		assert_eq!(text::count_occurrences("plan", ""), 0);
		assert_eq!(text::count_occurrences("", "plan"), 0);
	}

	#[test]
	fn words_are_deduplicated_in_order() {
		assert_eq!(text::words("Budget 2024, budget plan!"), vec!["budget", "2024", "plan"]);
	}

	#[test]
	fn split_keyword_breaks_on_punctuation() {
		assert_eq!(text::split_keyword("예산/2024, Q3-plan"), vec!["예산", "2024", "q3", "plan"]);
		assert!(text::split_keyword(" ,; ").is_empty());
	}

	#[test]
	fn truncate_respects_char_boundaries() {
		assert_eq!(text::truncate_chars("예산안입니다", 2), "예산");
		assert_eq!(text::truncate_chars("abc", 10), "abc");
		assert_eq!(text::char_prefix("roadmap", 3, 5).as_deref(), Some("roa"));
		assert_eq!(text::char_prefix("plan", 3, 5), None);
	}

	#[test]
	fn seed_token_skips_single_characters() {
		assert_eq!(text::seed_token("a Roadmap draft"), "roadmap");
		assert_eq!(text::seed_token(" x "), "x");
	}
}
