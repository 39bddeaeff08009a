use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
	sync::Arc,
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use atlas_service::{
	AtlasService, DocumentStore, MemoryStore, SearchRequest, SearchResponse, SearchStatus,
};
use atlas_storage::{db::Db, models::Document};

#[derive(Debug, Parser)]
#[command(
	version = atlas_cli::VERSION,
	rename_all = "kebab",
	styles = atlas_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// JSON array of documents to rank in memory instead of querying Postgres.
	#[arg(long, value_name = "FILE")]
	pub corpus: Option<PathBuf>,
	#[arg(long, value_name = "N", default_value_t = 1)]
	pub runs_per_query: u32,
}

#[derive(Debug, Deserialize)]
pub struct EvalDataset {
	pub name: Option<String>,
	pub defaults: Option<EvalDefaults>,
	pub queries: Vec<EvalQuery>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct EvalDefaults {
	pub source: Option<String>,
	pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EvalQuery {
	pub id: Option<String>,
	pub title_query: Option<String>,
	pub content_query: Option<String>,
	pub source: Option<String>,
	pub page_size: Option<u32>,
	pub expected_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EvalOutput {
	pub dataset: EvalDatasetInfo,
	pub settings: EvalSettings,
	pub summary: EvalSummary,
	pub queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
pub struct EvalDatasetInfo {
	pub name: String,
	pub query_count: usize,
}

#[derive(Debug, Serialize)]
pub struct EvalSettings {
	pub config_path: String,
	pub store: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub runs_per_query: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct EvalSummary {
	pub avg_recall_at_k: f64,
	pub avg_precision_at_k: f64,
	pub mean_rr: f64,
	pub mean_ndcg: f64,
	pub latency_ms_p50: f64,
	pub latency_ms_p95: f64,
	/// Queries that did not produce a ranking (empty query or index not ready).
	pub unranked_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stability: Option<StabilitySummary>,
}

#[derive(Debug, Serialize)]
pub struct StabilitySummary {
	pub runs_per_query: u32,
	pub avg_positional_churn_at_k: f64,
	pub avg_set_churn_at_k: f64,
}

#[derive(Debug, Serialize)]
pub struct QueryReport {
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title_query: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub content_query: Option<String>,
	pub status: SearchStatus,
	pub trace_id: Uuid,
	pub expected_count: usize,
	pub retrieved_count: usize,
	pub relevant_count: usize,
	pub recall_at_k: f64,
	pub precision_at_k: f64,
	pub rr: f64,
	pub ndcg: f64,
	pub latency_ms: f64,
	pub expected_ids: Vec<String>,
	pub retrieved_ids: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stability: Option<QueryStability>,
}

#[derive(Debug, Serialize, Clone, Copy)]
pub struct QueryStability {
	pub runs_per_query: u32,
	pub positional_churn_at_k: f64,
	pub set_churn_at_k: f64,
}

#[derive(Debug, PartialEq)]
struct Metrics {
	recall_at_k: f64,
	precision_at_k: f64,
	rr: f64,
	ndcg: f64,
	relevant_count: usize,
}

struct QueryRun {
	first: SearchResponse,
	latency_ms: f64,
	stability: Option<QueryStability>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = atlas_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let dataset = load_dataset(&args.dataset)?;
	let (store, store_label): (Arc<dyn DocumentStore>, String) = match &args.corpus {
		Some(path) => {
			let documents = load_corpus(path)?;

			tracing::info!(documents = documents.len(), "Loaded in-memory corpus.");

			(Arc::new(MemoryStore::new(documents)), format!("memory:{}", path.display()))
		},
		None => {
			let db = Db::connect(&config.storage.postgres).await?;

			db.ensure_schema().await?;

			(Arc::new(db), "postgres".to_string())
		},
	};
	let service = AtlasService::new(config, store);
	let mut output = evaluate(&service, &dataset, args.runs_per_query).await?;

	output.settings.config_path = args.config.display().to_string();
	output.settings.store = store_label;

	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

pub fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	validate_dataset(&dataset)?;

	Ok(dataset)
}

pub fn load_corpus(path: &Path) -> color_eyre::Result<Vec<Document>> {
	let raw = fs::read_to_string(path)?;
	let documents: Vec<Document> = serde_json::from_str(&raw)?;

	Ok(documents)
}

/// Runs every dataset query against `service` and scores the first run of each.
pub async fn evaluate(
	service: &AtlasService,
	dataset: &EvalDataset,
	runs_per_query: u32,
) -> color_eyre::Result<EvalOutput> {
	let defaults = dataset.defaults.clone().unwrap_or_default();
	let runs_per_query = runs_per_query.max(1);
	let mut reports = Vec::with_capacity(dataset.queries.len());
	let mut latencies_ms = Vec::with_capacity(dataset.queries.len());
	let mut stability_positional = Vec::new();
	let mut stability_set = Vec::new();

	for (index, query) in dataset.queries.iter().enumerate() {
		let id = query.id.clone().unwrap_or_else(|| format!("q{}", index + 1));
		let request = build_request(&defaults, query);
		let expected: HashSet<String> = query.expected_ids.iter().cloned().collect();
		let QueryRun { first, latency_ms, stability } =
			run_query_n_times(service, request, runs_per_query).await?;
		let retrieved = unique_ids(first.items.iter().map(|item| item.id.clone()));
		let metrics = compute_metrics(&retrieved, &expected);

		if let Some(stability) = stability {
			stability_positional.push(stability.positional_churn_at_k);
			stability_set.push(stability.set_churn_at_k);
		}
		if first.status != SearchStatus::Ok {
			tracing::warn!(query_id = %id, status = ?first.status, "Query produced no ranking.");
		}

		reports.push(QueryReport {
			id,
			title_query: query.title_query.clone(),
			content_query: query.content_query.clone(),
			status: first.status,
			trace_id: first.trace_id,
			expected_count: expected.len(),
			retrieved_count: retrieved.len(),
			relevant_count: metrics.relevant_count,
			recall_at_k: metrics.recall_at_k,
			precision_at_k: metrics.precision_at_k,
			rr: metrics.rr,
			ndcg: metrics.ndcg,
			latency_ms,
			expected_ids: query.expected_ids.clone(),
			retrieved_ids: retrieved,
			stability,
		});
		latencies_ms.push(latency_ms);
	}

	let mut summary = summarize(&reports, &latencies_ms);

	if runs_per_query > 1 && !stability_positional.is_empty() {
		let count = stability_positional.len() as f64;

		summary.stability = Some(StabilitySummary {
			runs_per_query,
			avg_positional_churn_at_k: stability_positional.iter().sum::<f64>() / count,
			avg_set_churn_at_k: stability_set.iter().sum::<f64>() / count,
		});
	}

	Ok(EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "eval".to_string()),
			query_count: reports.len(),
		},
		settings: EvalSettings {
			config_path: String::new(),
			store: String::new(),
			runs_per_query: (runs_per_query > 1).then_some(runs_per_query),
		},
		summary,
		queries: reports,
	})
}

fn validate_dataset(dataset: &EvalDataset) -> color_eyre::Result<()> {
	if dataset.queries.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one query."));
	}

	for (index, query) in dataset.queries.iter().enumerate() {
		let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());

		if blank(&query.title_query) && blank(&query.content_query) {
			return Err(eyre::eyre!(
				"Query {} must set title_query or content_query.",
				query.id.clone().unwrap_or_else(|| format!("#{}", index + 1))
			));
		}
	}

	Ok(())
}

fn build_request(defaults: &EvalDefaults, query: &EvalQuery) -> SearchRequest {
	SearchRequest {
		title_query: query.title_query.clone(),
		content_query: query.content_query.clone(),
		source: query.source.clone().or_else(|| defaults.source.clone()),
		page: Some(1),
		page_size: query.page_size.or(defaults.page_size),
		explain: Some(false),
	}
}

async fn run_query_n_times(
	service: &AtlasService,
	request: SearchRequest,
	runs_per_query: u32,
) -> color_eyre::Result<QueryRun> {
	let runs = runs_per_query.max(1);
	let mut first_response: Option<SearchResponse> = None;
	let mut first_retrieved: Vec<String> = Vec::new();
	let mut latency_total_ms = 0.0_f64;
	let mut positional_churn_sum = 0.0_f64;
	let mut set_churn_sum = 0.0_f64;
	let mut churn_count = 0_u32;

	for run_idx in 0..runs {
		let start = Instant::now();
		let response = service.search(request.clone()).await?;
		let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;
		let retrieved = unique_ids(response.items.iter().map(|item| item.id.clone()));

		latency_total_ms += latency_ms;

		let Some(first) = first_response.as_ref() else {
			first_retrieved = retrieved;
			first_response = Some(response);

			continue;
		};
		let k = (first.page_size as usize).max(1);
		let (positional_churn_at_k, set_churn_at_k) =
			churn_against_baseline_at_k(&first_retrieved, &retrieved, k);

		tracing::debug!(run_idx, positional_churn_at_k, set_churn_at_k, "Repeated run compared.");

		positional_churn_sum += positional_churn_at_k;
		set_churn_sum += set_churn_at_k;
		churn_count += 1;
	}

	let stability = (churn_count > 0).then(|| QueryStability {
		runs_per_query: runs,
		positional_churn_at_k: positional_churn_sum / f64::from(churn_count),
		set_churn_at_k: set_churn_sum / f64::from(churn_count),
	});
	let first = first_response.ok_or_else(|| eyre::eyre!("No search responses were collected."))?;

	Ok(QueryRun { first, latency_ms: latency_total_ms / f64::from(runs), stability })
}

/// Churn over the first `k` ids, where `k` shrinks to the longer of the two result lists.
fn churn_against_baseline_at_k(baseline: &[String], other: &[String], k: usize) -> (f64, f64) {
	if baseline.is_empty() && other.is_empty() {
		return (0.0, 0.0);
	}

	let k = k.min(baseline.len().max(other.len())).max(1);
	let positional_diff = (0..k).filter(|idx| baseline.get(*idx) != other.get(*idx)).count();
	let positional_churn = positional_diff as f64 / k as f64;
	let base_set: HashSet<&String> = baseline.iter().take(k).collect();
	let other_set: HashSet<&String> = other.iter().take(k).collect();
	let overlap = base_set.intersection(&other_set).count();
	let set_churn = 1.0 - (overlap as f64 / k as f64);

	(positional_churn, set_churn)
}

fn unique_ids<I>(iter: I) -> Vec<String>
where
	I: Iterator<Item = String>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for id in iter {
		if seen.insert(id.clone()) {
			out.push(id);
		}
	}

	out
}

fn compute_metrics(retrieved: &[String], expected: &HashSet<String>) -> Metrics {
	let expected_count = expected.len();
	let mut relevant_count = 0_usize;
	let mut dcg = 0.0_f64;
	let mut first_hit: Option<usize> = None;

	for (idx, id) in retrieved.iter().enumerate() {
		if !expected.contains(id) {
			continue;
		}

		let rank = idx + 1;

		relevant_count += 1;
		dcg += 1.0 / (rank as f64 + 1.0).log2();

		if first_hit.is_none() {
			first_hit = Some(rank);
		}
	}

	let rr = first_hit.map(|rank| 1.0 / rank as f64).unwrap_or(0.0);
	let ideal_hits = expected_count.min(retrieved.len());
	let idcg = (1..=ideal_hits).map(|rank| 1.0 / (rank as f64 + 1.0).log2()).sum::<f64>();
	let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };
	let precision_at_k =
		if retrieved.is_empty() { 0.0 } else { relevant_count as f64 / retrieved.len() as f64 };
	let recall_at_k =
		if expected_count == 0 { 0.0 } else { relevant_count as f64 / expected_count as f64 };

	Metrics { recall_at_k, precision_at_k, rr, ndcg, relevant_count }
}

fn summarize(reports: &[QueryReport], latencies_ms: &[f64]) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let avg_recall_at_k = reports.iter().map(|r| r.recall_at_k).sum::<f64>() / count;
	let avg_precision_at_k = reports.iter().map(|r| r.precision_at_k).sum::<f64>() / count;
	let mean_rr = reports.iter().map(|r| r.rr).sum::<f64>() / count;
	let mean_ndcg = reports.iter().map(|r| r.ndcg).sum::<f64>() / count;
	let unranked_count = reports.iter().filter(|r| r.status != SearchStatus::Ok).count();
	let mut sorted = latencies_ms.to_vec();

	sorted.sort_by(f64::total_cmp);

	EvalSummary {
		avg_recall_at_k,
		avg_precision_at_k,
		mean_rr,
		mean_ndcg,
		latency_ms_p50: percentile(&sorted, 0.50),
		latency_ms_p95: percentile(&sorted, 0.95),
		unranked_count,
		stability: None,
	}
}

/// Linear interpolation between closest ranks. `values` must be sorted.
fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn metrics_score_ranked_hits() {
		let expected: HashSet<String> = ids(&["b", "d"]).into_iter().collect();
		let metrics = compute_metrics(&ids(&["a", "b", "c"]), &expected);

		assert_eq!(metrics.relevant_count, 1);
		assert!((metrics.recall_at_k - 0.5).abs() < 1e-12);
		assert!((metrics.precision_at_k - 1.0 / 3.0).abs() < 1e-12);
		assert!((metrics.rr - 0.5).abs() < 1e-12);

		let ideal = 1.0 + 1.0 / 3.0_f64.log2();

		assert!((metrics.ndcg - (1.0 / 3.0_f64.log2()) / ideal).abs() < 1e-12);
	}

	#[test]
	fn metrics_are_zero_without_hits() {
		let expected: HashSet<String> = ids(&["z"]).into_iter().collect();
		let metrics = compute_metrics(&[], &expected);

		assert_eq!(
			metrics,
			Metrics { recall_at_k: 0.0, precision_at_k: 0.0, rr: 0.0, ndcg: 0.0, relevant_count: 0 }
		);
	}

	#[test]
	fn percentile_interpolates() {
		let values = [10.0, 20.0, 30.0, 40.0];

		assert_eq!(percentile(&values, 0.0), 10.0);
		assert_eq!(percentile(&values, 1.0), 40.0);
		assert!((percentile(&values, 0.5) - 25.0).abs() < 1e-12);
		assert_eq!(percentile(&[], 0.5), 0.0);
	}

	#[test]
	fn churn_counts_position_and_set_changes() {
		let baseline = ids(&["a", "b", "c"]);

		assert_eq!(churn_against_baseline_at_k(&baseline, &baseline, 3), (0.0, 0.0));

		let (positional, set) = churn_against_baseline_at_k(&baseline, &ids(&["b", "a", "d"]), 3);

		assert!((positional - 1.0).abs() < 1e-12);
		assert!((set - 1.0 / 3.0).abs() < 1e-12);
		assert_eq!(churn_against_baseline_at_k(&baseline, &baseline, 20), (0.0, 0.0));
		assert_eq!(churn_against_baseline_at_k(&[], &[], 20), (0.0, 0.0));
	}

	#[test]
	fn unique_ids_keep_first_occurrence() {
		assert_eq!(unique_ids(ids(&["a", "b", "a"]).into_iter()), ids(&["a", "b"]));
	}

	#[test]
	fn dataset_queries_need_a_query_text() {
		let dataset: EvalDataset = serde_json::from_value(serde_json::json!({
			"queries": [{ "id": "blank", "title_query": " ", "expected_ids": [] }]
		}))
		.expect("Failed to parse dataset.");
		let err = validate_dataset(&dataset).expect_err("Expected blank query to be rejected.");

		assert!(err.to_string().contains("blank"));

		let empty: EvalDataset = serde_json::from_value(serde_json::json!({ "queries": [] }))
			.expect("Failed to parse dataset.");

		assert!(validate_dataset(&empty).is_err());
	}

	#[test]
	fn query_fields_override_defaults() {
		let defaults = EvalDefaults { source: Some("drive".to_string()), page_size: Some(5) };
		let query = EvalQuery {
			id: None,
			title_query: Some("roadmap".to_string()),
			content_query: None,
			source: None,
			page_size: Some(3),
			expected_ids: Vec::new(),
		};
		let request = build_request(&defaults, &query);

		assert_eq!(request.source.as_deref(), Some("drive"));
		assert_eq!(request.page_size, Some(3));
		assert_eq!(request.page, Some(1));
	}
}
