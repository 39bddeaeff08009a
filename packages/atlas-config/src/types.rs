use serde::Deserialize;
use serde_json::{Map, Value};

/// Points added per keyword occurrence in a title.
pub const TITLE_HIT_WEIGHT: f64 = 5_000.0;
/// Points added per keyword occurrence in a snippet.
pub const SNIPPET_HIT_WEIGHT: f64 = 1_000.0;
/// Points added per keyword occurrence in extracted content.
pub const CONTENT_HIT_WEIGHT: f64 = 1_000.0;
/// Content occurrences counted per keyword before the count saturates.
pub const CONTENT_HIT_CAP: u32 = 20;
/// Flat bonus for candidates that match every keyword of a multi-keyword query.
pub const AND_BONUS: f64 = 50_000.0;
/// Flat bonus for rich-text kinds and structured-artifact sources.
pub const PRIORITY_BONUS: f64 = 1_000_000.0;
/// Multiplier that lifts a 0-1 semantic similarity onto the lexical scale.
pub const SEMANTIC_SCALE: f64 = 100.0;
pub const SEMANTIC_TITLE_WEIGHT: f32 = 0.7;
pub const SEMANTIC_CONTENT_WEIGHT: f32 = 0.3;
/// Blended similarities below this floor contribute nothing.
pub const SEMANTIC_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Optional. Without it content queries run keyword-only structuring.
	pub structurer: Option<StructurerProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_embedding_batch_size")]
	pub batch_size: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructurerProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Minimum indexed document count before rankings are considered reliable.
	pub usability_floor: u64,
	/// Row limit for a single pattern lookup against the document store.
	pub candidate_limit: u32,
	pub default_page_size: u32,
	pub max_page_size: u32,
	/// Fixed result cap for content and combined queries.
	pub content_top_n: u32,
	/// Pools smaller than this are expanded with per-keyword lookups.
	pub expansion_min_pool: u32,
	pub expansion_max_pool: u32,
	pub expansion_min_content_chars: u32,
	/// Content prefix, in characters, sent to the embedding provider.
	pub content_embed_chars: u32,
	pub max_keywords: u32,
	pub provider_timeout_ms: u64,
	pub cache: SearchCache,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			usability_floor: 50,
			candidate_limit: 300,
			default_page_size: 20,
			max_page_size: 100,
			content_top_n: 10,
			expansion_min_pool: 20,
			expansion_max_pool: 20,
			expansion_min_content_chars: 50,
			content_embed_chars: 5_000,
			max_keywords: 5,
			provider_timeout_ms: 8_000,
			cache: SearchCache::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCache {
	pub enabled: bool,
	pub ttl_secs: u64,
	pub max_entries: u32,
}
impl Default for SearchCache {
	fn default() -> Self {
		Self { enabled: true, ttl_secs: 30, max_entries: 1_024 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub title_hit_weight: f64,
	pub snippet_hit_weight: f64,
	pub content_hit_weight: f64,
	pub content_hit_cap: u32,
	pub and_bonus: f64,
	pub priority_bonus: f64,
	pub semantic_scale: f64,
	pub semantic_title_weight: f32,
	pub semantic_content_weight: f32,
	pub semantic_threshold: f32,
	pub priority: RankingPriority,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			title_hit_weight: TITLE_HIT_WEIGHT,
			snippet_hit_weight: SNIPPET_HIT_WEIGHT,
			content_hit_weight: CONTENT_HIT_WEIGHT,
			content_hit_cap: CONTENT_HIT_CAP,
			and_bonus: AND_BONUS,
			priority_bonus: PRIORITY_BONUS,
			semantic_scale: SEMANTIC_SCALE,
			semantic_title_weight: SEMANTIC_TITLE_WEIGHT,
			semantic_content_weight: SEMANTIC_CONTENT_WEIGHT,
			semantic_threshold: SEMANTIC_THRESHOLD,
			priority: RankingPriority::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingPriority {
	/// Case-insensitive fragments of `kind` values that count as rich text.
	pub rich_kinds: Vec<String>,
	/// Sources whose natural unit is a structured artifact (design files, tracked issues).
	pub structured_sources: Vec<String>,
}
impl Default for RankingPriority {
	fn default() -> Self {
		Self {
			rich_kinds: [
				"vnd.google-apps.document",
				"vnd.google-apps.spreadsheet",
				"vnd.google-apps.presentation",
				"wordprocessingml",
				"spreadsheetml",
				"presentationml",
				"msword",
				"ms-excel",
				"ms-powerpoint",
				"opendocument.text",
				"opendocument.spreadsheet",
				"opendocument.presentation",
			]
			.into_iter()
			.map(str::to_string)
			.collect(),
			structured_sources: ["design-tool", "tracker", "figma", "jira", "linear"]
				.into_iter()
				.map(str::to_string)
				.collect(),
		}
	}
}

fn default_embedding_batch_size() -> u32 {
	64
}
