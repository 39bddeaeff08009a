//! Word lists used by query structuring.

use crate::text;

/// Words that signal a conversational request rather than a bare keyword query.
pub const CONNECTORS: &[&str] = &[
	"find", "search", "related", "relating", "about", "regarding", "show", "list", "give", "get",
	"please", "where", "which", "what", "that", "with", "for", "and", "or", "대한", "대해",
	"해줘", "주세요", "그리고", "또는",
];

/// Hangul connector stems that take attached endings ("관련된", "찾아줘").
pub const CONNECTOR_STEMS: &[&str] = &["찾아", "찾기", "관련", "보여", "알려"];

/// Hangul particles that turn the word they end into a connector ("회의에서").
pub const CONNECTOR_PARTICLES: &[&str] = &["에서"];

/// Function words and meta terms that never make useful keywords.
pub const STOPWORDS: &[&str] = &[
	"a", "an", "the", "of", "in", "on", "at", "to", "for", "from", "by", "with", "and", "or", "is",
	"are", "was", "be", "it", "this", "that", "these", "those", "me", "my", "i", "we", "our",
	"you", "please", "find", "search", "show", "list", "give", "get", "about", "regarding",
	"related", "relating", "document", "documents", "doc", "docs", "file", "files", "content",
	"contents", "문서", "자료", "파일", "내용", "관련", "관련된", "대한", "찾아", "찾아줘",
	"보여줘", "알려줘", "주세요", "해줘", "좀",
];

/// Multi-word meta phrases removed before tokenizing.
pub const STOP_PHRASES: &[&str] = &["show me", "find me", "look for", "related to", "관련 문서"];

pub fn is_stopword(word: &str) -> bool {
	STOPWORDS.contains(&word)
}

/// Whether `token` is a connector word.
///
/// Whole tokens match [`CONNECTORS`]. Hangul tokens also match when they start with a
/// [`CONNECTOR_STEMS`] entry or end with a [`CONNECTOR_PARTICLES`] entry after at least one
/// more character.
pub fn is_connector(token: &str) -> bool {
	let token = text::normalize(token);

	if CONNECTORS.contains(&token.as_str()) {
		return true;
	}
	if !text::contains_hangul(&token) {
		return false;
	}

	CONNECTOR_STEMS.iter().any(|stem| token.starts_with(stem))
		|| CONNECTOR_PARTICLES
			.iter()
			.any(|particle| token.len() > particle.len() && token.ends_with(particle))
}

pub fn contains_connector(query: &str) -> bool {
	query.split_whitespace().any(is_connector)
}

/// Lowercases `query` and blanks out every stop phrase.
pub fn strip_stop_phrases(query: &str) -> String {
	let mut out = text::normalize(query);

	for phrase in STOP_PHRASES {
		if out.contains(phrase) {
			out = out.replace(phrase, " ");
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use crate::lexicon;

	#[test]
	fn latin_connectors_match_whole_tokens() {
		assert!(lexicon::is_connector("Find"));
		assert!(!lexicon::is_connector("finder"));
	}

	#[test]
	fn hangul_connectors_match_stems_and_particles() {
		assert!(lexicon::is_connector("관련된"));
		assert!(lexicon::is_connector("대한"));
		assert!(lexicon::is_connector("회의에서"));
		assert!(lexicon::contains_connector("예산 관련 문서 찾아줘"));
		assert!(!lexicon::contains_connector("예산 2024"));
	}

	#[test]
	fn hangul_connectors_do_not_fire_inside_ordinary_words() {
		assert!(!lexicon::is_connector("대한민국"));
		assert!(!lexicon::is_connector("에서"));
		assert!(!lexicon::is_connector("한국관련"));
		assert!(!lexicon::contains_connector("대한민국 예산"));
	}

	#[test]
	fn stop_phrases_are_blanked() {
		assert_eq!(lexicon::strip_stop_phrases("Show me roadmap").trim(), "roadmap");
	}
}
