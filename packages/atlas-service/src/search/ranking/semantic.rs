use crate::search::ranking::ScoredCandidate;
use atlas_config::Ranking;
use atlas_domain::{similarity, text};

/// Texts to embed for a candidate pool.
#[derive(Debug, Default)]
pub struct EmbeddingInputs {
	/// One title per candidate, in pool order.
	pub titles: Vec<String>,
	/// Truncated content for candidates that have any.
	pub contents: Vec<String>,
	/// For each candidate, its index into `contents`.
	pub content_slots: Vec<Option<usize>>,
}

pub fn embedding_inputs(candidates: &[ScoredCandidate], content_chars: usize) -> EmbeddingInputs {
	let mut inputs = EmbeddingInputs::default();

	for candidate in candidates {
		inputs.titles.push(candidate.doc.title.clone());

		let content = candidate.doc.content.as_deref().map(str::trim).unwrap_or_default();

		if content.is_empty() {
			inputs.content_slots.push(None);

			continue;
		}

		inputs.content_slots.push(Some(inputs.contents.len()));
		inputs.contents.push(text::truncate_chars(content, content_chars).to_string());
	}

	inputs
}

/// Writes title/content similarity and the blended semantic score onto each candidate.
///
/// Missing or empty vectors score 0. Candidates without any keyword hit never receive a
/// semantic score.
pub fn apply_similarity(
	candidates: &mut [ScoredCandidate],
	query_vec: &[f32],
	title_vecs: &[Vec<f32>],
	content_vecs: &[Vec<f32>],
	content_slots: &[Option<usize>],
	ranking: &Ranking,
) {
	for (idx, candidate) in candidates.iter_mut().enumerate() {
		let title_sim = title_vecs
			.get(idx)
			.map(|vec| similarity::cosine_similarity(query_vec, vec))
			.unwrap_or(0.0);
		let content_sim = content_slots
			.get(idx)
			.copied()
			.flatten()
			.and_then(|slot| content_vecs.get(slot))
			.map(|vec| similarity::cosine_similarity(query_vec, vec))
			.unwrap_or(0.0);
		let blended = similarity::blend_similarity(
			title_sim,
			content_sim,
			ranking.semantic_title_weight,
			ranking.semantic_content_weight,
			ranking.semantic_threshold,
		);

		candidate.title_similarity = title_sim;
		candidate.content_similarity = content_sim;
		candidate.semantic_score = if candidate.has_keyword { f64::from(blended) } else { 0.0 };
	}
}
