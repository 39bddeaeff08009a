mod aggregate;
mod lexical;
mod query;
mod retrieval;
mod semantic;
mod structure;

pub(super) use aggregate::{apply_must_filters, finalize_scores, paginate, sort_candidates};
pub(super) use lexical::{apply_title_filter, score_lexical};
pub(super) use query::{merge_keywords, resolve_mode, retrieval_seed, title_keywords};
pub(super) use retrieval::merge_expansion;
pub(super) use semantic::{apply_similarity, embedding_inputs};
pub(super) use structure::{
	StructuredQuery, fallback_structure, heuristic_structure, is_simple_query,
	provider_structure,
};

use time::OffsetDateTime;

use atlas_domain::text;
use atlas_storage::models::Document;

/// A document moving through the scoring stages.
///
/// The normalized fields are computed once at retrieval; every scorer adds to the score fields.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
	pub doc: Document,
	pub title: String,
	pub snippet: String,
	pub content: String,
	pub lexical_score: f64,
	pub semantic_score: f64,
	pub title_similarity: f32,
	pub content_similarity: f32,
	pub priority_score: f64,
	pub total_score: f64,
	pub has_keyword: bool,
	pub matched_keywords: Vec<String>,
}
impl ScoredCandidate {
	pub fn new(doc: Document) -> Self {
		let title = text::normalize(&doc.title);
		let snippet = text::normalize(&doc.snippet);
		let content = doc.content.as_deref().map(text::normalize).unwrap_or_default();

		Self {
			doc,
			title,
			snippet,
			content,
			lexical_score: 0.0,
			semantic_score: 0.0,
			title_similarity: 0.0,
			content_similarity: 0.0,
			priority_score: 0.0,
			total_score: 0.0,
			has_keyword: false,
			matched_keywords: Vec::new(),
		}
	}

	pub fn updated_at(&self) -> OffsetDateTime {
		self.doc.updated_at
	}
}
