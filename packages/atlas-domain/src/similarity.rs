/// Cosine similarity between two embedding vectors.
///
/// Empty or mismatched vectors score 0. A zero norm product is replaced by 1, so a zero vector
/// scores 0 rather than NaN.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	let mut denominator = lhs_norm.sqrt() * rhs_norm.sqrt();

	if denominator <= f32::EPSILON {
		denominator = 1.0;
	}

	(dot / denominator).clamp(-1.0, 1.0)
}

/// Blends title and content similarity into one semantic score.
///
/// Content only participates when it is positive; below `threshold` the blend collapses to 0.
pub fn blend_similarity(
	title_sim: f32,
	content_sim: f32,
	title_weight: f32,
	content_weight: f32,
	threshold: f32,
) -> f32 {
	let blended = if content_sim > 0.0 {
		title_weight * title_sim + content_weight * content_sim
	} else {
		title_sim
	};

	if blended < threshold { 0.0 } else { blended }
}

#[cfg(test)]
mod tests {
	use crate::similarity;

	#[test]
	fn identical_vectors_score_one() {
		let score = similarity::cosine_similarity(&[0.6, 0.8], &[0.6, 0.8]);

		assert!((score - 1.0).abs() < 1e-6);
	}

	#[test]
	fn degenerate_vectors_score_zero() {
		assert_eq!(similarity::cosine_similarity(&[], &[]), 0.0);
		assert_eq!(similarity::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
		assert_eq!(similarity::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
	}

	#[test]
	fn blend_uses_title_alone_without_content() {
		assert_eq!(similarity::blend_similarity(0.5, 0.0, 0.7, 0.3, 0.3), 0.5);
	}

	#[test]
	fn blend_below_threshold_is_zero() {
		assert_eq!(similarity::blend_similarity(0.2, 0.25, 0.7, 0.3, 0.3), 0.0);

		let blended = similarity::blend_similarity(0.8, 0.5, 0.7, 0.3, 0.3);

		assert!((blended - 0.71).abs() < 1e-5);
	}
}
