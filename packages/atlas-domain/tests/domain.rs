use atlas_domain::{lexicon, similarity, text};

#[test]
fn stopwords_cover_meta_terms() {
	for word in ["document", "related", "the", "문서", "관련"] {
		assert!(lexicon::is_stopword(word), "Expected {word} to be a stopword.");
	}

	assert!(!lexicon::is_stopword("roadmap"));
	assert!(!lexicon::is_stopword("예산"));
}

#[test]
fn short_keyword_queries_have_no_connectors() {
	assert!(!lexicon::contains_connector("로드맵"));
	assert!(!lexicon::contains_connector("Q3 roadmap"));
	assert!(lexicon::contains_connector("please find the Q3 roadmap"));
}

#[test]
fn normalized_text_matches_across_case_and_composition() {
	let title = text::normalize("2024 예산 Draft");

	assert_eq!(text::count_occurrences(&title, &text::normalize("DRAFT")), 1);
	assert_eq!(text::count_occurrences(&title, "예산"), 1);
}

#[test]
fn orthogonal_vectors_have_zero_similarity() {
	assert_eq!(similarity::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
}
