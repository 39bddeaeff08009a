mod ranking;

use std::{
	fmt,
	time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	AtlasService, Error, Result,
	cache::{self, CacheKind},
};
use ranking::{ScoredCandidate, StructuredQuery};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub title_query: Option<String>,
	pub content_query: Option<String>,
	/// Restricts retrieval to one origin tag.
	pub source: Option<String>,
	/// 1-based. Only title-only searches paginate.
	pub page: Option<u32>,
	pub page_size: Option<u32>,
	pub explain: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
	Title,
	Content,
	Both,
}
impl QueryMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::Content => "content",
			Self::Both => "both",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
	Ok,
	/// Neither query was supplied. Nothing was executed.
	EmptyQuery,
	/// The index holds fewer documents than the usability floor. Nothing was ranked.
	IndexNotReady,
}

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	#[default]
	Idle,
	Retrieving,
	Structuring,
	LexicalScoring,
	SemanticScoring,
	Aggregating,
	Done,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Retrieving => "retrieving",
			Self::Structuring => "structuring",
			Self::LexicalScoring => "lexical_scoring",
			Self::SemanticScoring => "semantic_scoring",
			Self::Aggregating => "aggregating",
			Self::Done => "done",
		}
	}
}
impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where the content-query keywords came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureSource {
	/// Short keyword query; the provider was not consulted.
	Heuristic,
	Provider,
	/// The provider failed or timed out; raw-query keywords were used.
	Fallback,
	/// No structuring provider is configured; raw-query keywords were used.
	Unconfigured,
	Cache,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
	/// The lexical candidates were numerous enough to score as-is.
	Narrow,
	/// The lexical candidates were widened with per-keyword lookups.
	Expanded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePool {
	pub kind: PoolKind,
	pub size: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SemanticStatus {
	#[default]
	NotRequested,
	Ran,
	Skipped {
		reason: String,
	},
}

/// A provider failure the pipeline recovered from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
	pub stage: Stage,
	pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
	pub stage: Stage,
	pub elapsed_ms: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchDiagnostics {
	pub mode: Option<QueryMode>,
	/// The last stage entered.
	pub stage: Stage,
	pub seed: Option<String>,
	pub index_count: Option<u64>,
	pub usability_floor: u64,
	pub keywords: Vec<String>,
	pub title_must: Vec<String>,
	pub content_must: Vec<String>,
	pub intent: Option<String>,
	pub structure_source: Option<StructureSource>,
	pub retrieved: usize,
	pub after_title_filter: usize,
	pub after_must_filter: usize,
	pub pool: Option<CandidatePool>,
	pub semantic: SemanticStatus,
	pub cache_hits: Vec<CacheKind>,
	pub degradations: Vec<Degradation>,
	pub timings: Vec<StageTiming>,
	pub elapsed_ms: u64,
}
impl SearchDiagnostics {
	fn new(usability_floor: u64) -> Self {
		Self { usability_floor, ..Default::default() }
	}

	fn enter(&mut self, stage: Stage) -> Instant {
		self.stage = stage;

		Instant::now()
	}

	fn record(&mut self, stage: Stage, started: Instant) {
		self.timings.push(StageTiming { stage, elapsed_ms: elapsed_ms(started) });
	}

	fn degrade(&mut self, stage: Stage, message: String) {
		self.degradations.push(Degradation { stage, message });
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchItemExplain {
	pub lexical: f64,
	pub semantic: f64,
	pub title_similarity: f32,
	pub content_similarity: f32,
	pub priority: f64,
	pub total: f64,
	pub matched_keywords: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchItem {
	pub id: String,
	pub source: String,
	pub title: String,
	pub snippet: String,
	pub path: String,
	pub kind: String,
	#[serde(with = "atlas_storage::time_serde")]
	pub updated_at: OffsetDateTime,
	pub score: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub explain: Option<SearchItemExplain>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub status: SearchStatus,
	pub items: Vec<SearchItem>,
	/// Title-only: every ranked match. Content and combined: the number of items returned.
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
	pub diagnostics: SearchDiagnostics,
}
impl SearchResponse {
	fn without_items(
		trace_id: Uuid,
		status: SearchStatus,
		page: u32,
		page_size: u32,
		diagnostics: SearchDiagnostics,
	) -> Self {
		Self { trace_id, status, items: Vec::new(), total: 0, page, page_size, diagnostics }
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexStatus {
	pub source: Option<String>,
	pub document_count: u64,
	pub usability_floor: u64,
	pub ready: bool,
}

impl AtlasService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let started = Instant::now();
		let search_cfg = &self.cfg.search;
		let page = req.page.unwrap_or(1);
		let requested_page_size = req.page_size.unwrap_or(search_cfg.default_page_size);

		if page == 0 {
			return Err(Error::InvalidRequest { message: "page must be 1 or greater.".to_string() });
		}
		if requested_page_size == 0 {
			return Err(Error::InvalidRequest {
				message: "page_size must be 1 or greater.".to_string(),
			});
		}

		let page_size = requested_page_size.min(search_cfg.max_page_size);
		let title_query = req.title_query.as_deref().map(str::trim).unwrap_or_default();
		let content_query = req.content_query.as_deref().map(str::trim).unwrap_or_default();
		let source = req.source.as_deref().map(str::trim).filter(|source| !source.is_empty());
		let explain = req.explain.unwrap_or(false);
		let trace_id = Uuid::new_v4();
		let mut diagnostics = SearchDiagnostics::new(search_cfg.usability_floor);
		let Some(mode) = ranking::resolve_mode(title_query, content_query) else {
			diagnostics.elapsed_ms = elapsed_ms(started);

			tracing::debug!(trace_id = %trace_id, "Empty query; nothing to search.");

			return Ok(SearchResponse::without_items(
				trace_id,
				SearchStatus::EmptyQuery,
				page,
				page_size,
				diagnostics,
			));
		};

		diagnostics.mode = Some(mode);

		let stage_started = diagnostics.enter(Stage::Retrieving);
		let index_count = match self.store.count(source).await {
			Ok(count) => count,
			Err(err) => return Err(retrieval_failed(Stage::Retrieving, err, diagnostics, started)),
		};

		diagnostics.index_count = Some(index_count);

		if index_count < search_cfg.usability_floor {
			diagnostics.record(Stage::Retrieving, stage_started);
			diagnostics.elapsed_ms = elapsed_ms(started);

			tracing::warn!(
				trace_id = %trace_id,
				index_count,
				usability_floor = search_cfg.usability_floor,
				"Index is below the usability floor; ranking skipped."
			);

			return Ok(SearchResponse::without_items(
				trace_id,
				SearchStatus::IndexNotReady,
				page,
				page_size,
				diagnostics,
			));
		}

		let seed = ranking::retrieval_seed(mode, title_query, content_query);
		let documents =
			match self.store.find_by_pattern(&seed, source, search_cfg.candidate_limit).await {
				Ok(documents) => documents,
				Err(err) =>
					return Err(retrieval_failed(Stage::Retrieving, err, diagnostics, started)),
			};

		diagnostics.seed = Some(seed);
		diagnostics.retrieved = documents.len();

		let mut candidates: Vec<ScoredCandidate> =
			documents.into_iter().map(ScoredCandidate::new).collect();

		diagnostics.record(Stage::Retrieving, stage_started);

		let title_keywords = match mode {
			QueryMode::Content => Vec::new(),
			QueryMode::Title | QueryMode::Both => ranking::title_keywords(title_query),
		};
		let structured = match mode {
			QueryMode::Title => None,
			QueryMode::Content | QueryMode::Both => {
				let stage_started = diagnostics.enter(Stage::Structuring);
				let structured = self.structure_query(content_query, &mut diagnostics).await;

				diagnostics.record(Stage::Structuring, stage_started);

				Some(structured)
			},
		};
		let keywords = match structured.as_ref() {
			None => title_keywords.clone(),
			Some(structured) if mode == QueryMode::Both =>
				ranking::merge_keywords(&title_keywords, &structured.keywords),
			Some(structured) => structured.keywords.clone(),
		};

		diagnostics.keywords = keywords.clone();

		if let Some(structured) = structured.as_ref() {
			diagnostics.title_must = structured.title_must.clone();
			diagnostics.content_must = structured.content_must.clone();
			diagnostics.intent = structured.intent.clone();
		}

		let stage_started = diagnostics.enter(Stage::LexicalScoring);

		if mode != QueryMode::Content {
			ranking::apply_title_filter(&mut candidates, &title_keywords);
		}

		diagnostics.after_title_filter = candidates.len();

		ranking::score_lexical(&mut candidates, &keywords, &self.cfg.ranking);
		diagnostics.record(Stage::LexicalScoring, stage_started);

		if mode != QueryMode::Title {
			let stage_started = diagnostics.enter(Stage::SemanticScoring);
			let pool_kind = if candidates.len() < search_cfg.expansion_min_pool as usize {
				let existing = candidates.len();
				let title_filter = match mode {
					QueryMode::Both => Some(title_keywords.as_slice()),
					QueryMode::Title | QueryMode::Content => None,
				};

				candidates =
					match self.expand_pool(candidates, &keywords, title_filter, source).await {
						Ok(candidates) => candidates,
						Err(err) =>
							return Err(retrieval_failed(
								Stage::SemanticScoring,
								err,
								diagnostics,
								started,
							)),
					};

				ranking::score_lexical(&mut candidates[existing..], &keywords, &self.cfg.ranking);

				PoolKind::Expanded
			} else {
				PoolKind::Narrow
			};

			diagnostics.pool = Some(CandidatePool { kind: pool_kind, size: candidates.len() });

			self.score_semantic(content_query, &mut candidates, &mut diagnostics).await;
			diagnostics.record(Stage::SemanticScoring, stage_started);
		}

		let stage_started = diagnostics.enter(Stage::Aggregating);

		ranking::finalize_scores(&mut candidates, &self.cfg.ranking);

		if let Some(structured) = structured.as_ref() {
			ranking::apply_must_filters(
				&mut candidates,
				&structured.title_must,
				&structured.content_must,
			);
		}

		diagnostics.after_must_filter = candidates.len();

		ranking::sort_candidates(&mut candidates);

		let (total, ranked, page, page_size) = match mode {
			QueryMode::Title => {
				let total = candidates.len() as u64;
				let offset = (page as usize - 1).saturating_mul(page_size as usize);

				(total, ranking::paginate(candidates, offset, page_size as usize), page, page_size)
			},
			QueryMode::Content | QueryMode::Both => {
				let top_n = search_cfg.content_top_n;
				let ranked = ranking::paginate(candidates, 0, top_n as usize);

				(ranked.len() as u64, ranked, 1, top_n)
			},
		};
		let items = ranked.into_iter().map(|candidate| build_item(candidate, explain)).collect();

		diagnostics.record(Stage::Aggregating, stage_started);
		diagnostics.stage = Stage::Done;
		diagnostics.elapsed_ms = elapsed_ms(started);

		tracing::info!(
			trace_id = %trace_id,
			mode = mode.as_str(),
			total,
			semantic = ?diagnostics.semantic,
			degradations = diagnostics.degradations.len(),
			elapsed_ms = diagnostics.elapsed_ms,
			"Search completed."
		);

		Ok(SearchResponse {
			trace_id,
			status: SearchStatus::Ok,
			items,
			total,
			page,
			page_size,
			diagnostics,
		})
	}

	pub async fn index_status(&self, source: Option<&str>) -> Result<IndexStatus> {
		let source = source.map(str::trim).filter(|source| !source.is_empty());
		let document_count = self.store.count(source).await?;
		let usability_floor = self.cfg.search.usability_floor;

		Ok(IndexStatus {
			source: source.map(str::to_string),
			document_count,
			usability_floor,
			ready: document_count >= usability_floor,
		})
	}

	fn provider_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.provider_timeout_ms)
	}

	async fn structure_query(
		&self,
		query: &str,
		diagnostics: &mut SearchDiagnostics,
	) -> StructuredQuery {
		let max_keywords = self.cfg.search.max_keywords as usize;

		if ranking::is_simple_query(query) {
			diagnostics.structure_source = Some(StructureSource::Heuristic);

			return ranking::heuristic_structure(query, max_keywords);
		}

		let Some(cfg) = self.cfg.providers.structurer.as_ref() else {
			diagnostics.structure_source = Some(StructureSource::Unconfigured);

			return ranking::fallback_structure(query, max_keywords);
		};
		let cache_key = match self.cache.as_ref() {
			Some(_) => match cache::build_structure_cache_key(
				query,
				&cfg.provider_id,
				&cfg.model,
				cfg.temperature,
			) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_kind = CacheKind::Structure.as_str(),
						"Cache key build failed."
					);

					None
				},
			},
			None => None,
		};

		if let Some(cache) = self.cache.as_ref()
			&& let Some(key) = cache_key.as_deref()
			&& let Some(raw) = cache.get(CacheKind::Structure, key)
		{
			if let Some(structured) = ranking::provider_structure(&raw, query, max_keywords) {
				tracing::debug!(
					cache_kind = CacheKind::Structure.as_str(),
					cache_key_prefix = cache::cache_key_prefix(key),
					hit = true,
					"Cache hit."
				);

				diagnostics.structure_source = Some(StructureSource::Cache);
				diagnostics.cache_hits.push(CacheKind::Structure);

				return structured;
			}

			tracing::warn!(
				cache_kind = CacheKind::Structure.as_str(),
				cache_key_prefix = cache::cache_key_prefix(key),
				"Cache payload decode failed."
			);
		}

		let timeout = self.provider_timeout();
		let raw =
			match tokio::time::timeout(timeout, self.providers.structurer.structure(cfg, query))
				.await
			{
				Ok(Ok(raw)) => raw,
				Ok(Err(err)) => {
					tracing::warn!(
						error = %err,
						"Query structuring failed; falling back to raw query keywords."
					);

					diagnostics.degrade(Stage::Structuring, err.to_string());

					return self.fallback_structure(query, diagnostics);
				},
				Err(_) => {
					tracing::warn!(
						timeout_ms = self.cfg.search.provider_timeout_ms,
						"Query structuring timed out; falling back to raw query keywords."
					);

					diagnostics.degrade(
						Stage::Structuring,
						format!(
							"Structuring provider timed out after {} ms.",
							self.cfg.search.provider_timeout_ms
						),
					);

					return self.fallback_structure(query, diagnostics);
				},
			};
		let Some(structured) = ranking::provider_structure(&raw, query, max_keywords) else {
			tracing::warn!("Query structuring returned a non-object payload; falling back.");

			diagnostics.degrade(
				Stage::Structuring,
				"Structuring provider returned a non-object payload.".to_string(),
			);

			return self.fallback_structure(query, diagnostics);
		};

		if let Some(cache) = self.cache.as_ref()
			&& let Some(key) = cache_key.as_deref()
		{
			let purged = cache.purge_expired();

			cache.set(CacheKind::Structure, key, raw);

			tracing::debug!(
				cache_kind = CacheKind::Structure.as_str(),
				cache_key_prefix = cache::cache_key_prefix(key),
				purged,
				"Cache stored."
			);
		}

		diagnostics.structure_source = Some(StructureSource::Provider);

		structured
	}

	fn fallback_structure(
		&self,
		query: &str,
		diagnostics: &mut SearchDiagnostics,
	) -> StructuredQuery {
		diagnostics.structure_source = Some(StructureSource::Fallback);

		ranking::fallback_structure(query, self.cfg.search.max_keywords as usize)
	}

	async fn expand_pool(
		&self,
		candidates: Vec<ScoredCandidate>,
		keywords: &[String],
		title_keywords: Option<&[String]>,
		source: Option<&str>,
	) -> Result<Vec<ScoredCandidate>> {
		let search_cfg = &self.cfg.search;
		let mut fetched = Vec::new();

		for keyword in keywords {
			let documents =
				self.store.find_by_pattern(keyword, source, search_cfg.candidate_limit).await?;

			fetched.extend(documents);
		}

		Ok(ranking::merge_expansion(
			candidates,
			fetched,
			keywords,
			title_keywords,
			search_cfg.expansion_min_content_chars as usize,
			search_cfg.expansion_max_pool as usize,
		))
	}

	async fn score_semantic(
		&self,
		query: &str,
		candidates: &mut [ScoredCandidate],
		diagnostics: &mut SearchDiagnostics,
	) {
		if candidates.is_empty() {
			diagnostics.semantic =
				SemanticStatus::Skipped { reason: "Candidate pool is empty.".to_string() };

			return;
		}

		let inputs =
			ranking::embedding_inputs(candidates, self.cfg.search.content_embed_chars as usize);
		let (query_result, titles, contents) = tokio::join!(
			self.embed_query(query),
			self.embed_batches(&inputs.titles),
			self.embed_batches(&inputs.contents),
		);
		let (title_vecs, title_failures) = titles;
		let (content_vecs, content_failures) = contents;
		let (query_vec, cached) = match query_result {
			Ok(embedded) => embedded,
			Err(reason) => {
				tracing::warn!(reason = %reason, "Semantic scoring skipped.");

				diagnostics.degrade(Stage::SemanticScoring, reason.clone());
				diagnostics.semantic = SemanticStatus::Skipped { reason };

				return;
			},
		};

		if cached {
			diagnostics.cache_hits.push(CacheKind::QueryEmbedding);
		}

		for failure in title_failures.into_iter().chain(content_failures) {
			tracing::warn!(reason = %failure, "Embedding batch degraded.");

			diagnostics.degrade(Stage::SemanticScoring, failure);
		}

		if title_vecs.iter().chain(content_vecs.iter()).all(Vec::is_empty) {
			let reason = "All candidate embeddings failed.".to_string();

			tracing::warn!(reason = %reason, "Semantic scoring skipped.");

			diagnostics.semantic = SemanticStatus::Skipped { reason };

			return;
		}

		ranking::apply_similarity(
			candidates,
			&query_vec,
			&title_vecs,
			&content_vecs,
			&inputs.content_slots,
			&self.cfg.ranking,
		);

		diagnostics.semantic = SemanticStatus::Ran;
	}

	/// Embeds the query text. The boolean is true when the vector came from the cache.
	async fn embed_query(&self, query: &str) -> std::result::Result<(Vec<f32>, bool), String> {
		let cfg = &self.cfg.providers.embedding;
		let cache_key = match self.cache.as_ref() {
			Some(_) => cache::build_query_embedding_cache_key(
				query,
				&cfg.provider_id,
				&cfg.model,
				cfg.dimensions,
			)
			.ok(),
			None => None,
		};

		if let Some(cache) = self.cache.as_ref()
			&& let Some(key) = cache_key.as_deref()
			&& let Some(raw) = cache.get(CacheKind::QueryEmbedding, key)
			&& let Ok(vector) = serde_json::from_value::<Vec<f32>>(raw)
			&& !vector.is_empty()
		{
			tracing::debug!(
				cache_kind = CacheKind::QueryEmbedding.as_str(),
				cache_key_prefix = cache::cache_key_prefix(key),
				hit = true,
				"Cache hit."
			);

			return Ok((vector, true));
		}

		let texts = [query.to_string()];
		let vector = match tokio::time::timeout(
			self.provider_timeout(),
			self.providers.embedding.embed(cfg, &texts),
		)
		.await
		{
			Ok(Ok(vectors)) => vectors.into_iter().next().filter(|vector| !vector.is_empty()),
			Ok(Err(err)) => return Err(format!("Query embedding failed: {err}")),
			Err(_) =>
				return Err(format!(
					"Query embedding timed out after {} ms.",
					self.cfg.search.provider_timeout_ms
				)),
		};
		let Some(vector) = vector else {
			return Err("Embedding provider returned no query vector.".to_string());
		};

		if let Some(cache) = self.cache.as_ref()
			&& let Some(key) = cache_key.as_deref()
			&& let Ok(value) = serde_json::to_value(&vector)
		{
			cache.set(CacheKind::QueryEmbedding, key, value);
		}

		Ok((vector, false))
	}

	/// Embeds `texts` in provider-sized batches.
	///
	/// A failed batch yields empty vectors for its items and one failure message.
	async fn embed_batches(&self, texts: &[String]) -> (Vec<Vec<f32>>, Vec<String>) {
		let cfg = &self.cfg.providers.embedding;
		let batch_size = (cfg.batch_size as usize).max(1);
		let mut vectors = Vec::with_capacity(texts.len());
		let mut failures = Vec::new();

		for batch in texts.chunks(batch_size) {
			let embedding = self.providers.embedding.embed(cfg, batch);
			let result = tokio::time::timeout(self.provider_timeout(), embedding).await;
			let failure = match result {
				Ok(Ok(embedded)) if embedded.len() == batch.len() => {
					vectors.extend(embedded);

					continue;
				},
				Ok(Ok(embedded)) => format!(
					"Embedding batch returned {} vectors for {} inputs.",
					embedded.len(),
					batch.len()
				),
				Ok(Err(err)) => format!("Embedding batch failed: {err}"),
				Err(_) => format!(
					"Embedding batch timed out after {} ms.",
					self.cfg.search.provider_timeout_ms
				),
			};

			vectors.extend(std::iter::repeat_with(Vec::new).take(batch.len()));
			failures.push(failure);
		}

		(vectors, failures)
	}
}

fn build_item(candidate: ScoredCandidate, explain: bool) -> SearchItem {
	let explain = explain.then(|| SearchItemExplain {
		lexical: candidate.lexical_score,
		semantic: candidate.semantic_score,
		title_similarity: candidate.title_similarity,
		content_similarity: candidate.content_similarity,
		priority: candidate.priority_score,
		total: candidate.total_score,
		matched_keywords: candidate.matched_keywords.clone(),
	});
	let doc = candidate.doc;

	SearchItem {
		id: doc.id,
		source: doc.source,
		title: doc.title,
		snippet: doc.snippet,
		path: doc.path,
		kind: doc.kind,
		updated_at: doc.updated_at,
		score: candidate.total_score,
		explain,
	}
}

fn retrieval_failed(
	stage: Stage,
	err: Error,
	mut diagnostics: SearchDiagnostics,
	started: Instant,
) -> Error {
	diagnostics.stage = stage;
	diagnostics.elapsed_ms = elapsed_ms(started);

	tracing::error!(stage = stage.as_str(), error = %err, "Document store lookup failed.");

	Error::RetrievalFailed { stage, message: err.to_string(), diagnostics: Box::new(diagnostics) }
}

fn elapsed_ms(started: Instant) -> u64 {
	started.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

