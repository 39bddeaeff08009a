use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use atlas_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("atlas_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected sample config to load.");

	assert_eq!(cfg.search.usability_floor, 50);
	assert_eq!(cfg.search.content_top_n, 10);
	assert!(cfg.providers.structurer.is_some());
	assert_eq!(cfg.ranking.priority.structured_sources, vec!["design-tool", "tracker"]);
}

#[test]
fn search_and_ranking_sections_default_when_omitted() {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Sample config must be a table.");

	root.remove("search");
	root.remove("ranking");

	let path = write_temp_config(render(&value));
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected defaults to apply.");

	assert_eq!(cfg.search.usability_floor, 50);
	assert_eq!(cfg.search.expansion_min_pool, 20);
	assert_eq!(cfg.search.content_embed_chars, 5_000);
	assert_eq!(cfg.ranking.title_hit_weight, atlas_config::TITLE_HIT_WEIGHT);
	assert_eq!(cfg.ranking.and_bonus, atlas_config::AND_BONUS);
	assert_eq!(cfg.ranking.priority_bonus, atlas_config::PRIORITY_BONUS);
	assert!(cfg.ranking.priority.rich_kinds.iter().any(|kind| kind == "spreadsheetml"));
}

#[test]
fn structurer_section_is_optional() {
	let mut value = sample_value();
	let providers = value
		.get_mut("providers")
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [providers].");

	providers.remove("structurer");

	let path = write_temp_config(render(&value));
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Expected config without structurer to load.");

	assert!(cfg.providers.structurer.is_none());
}

#[test]
fn blank_structurer_api_base_disables_structurer() {
	let mut value = sample_value();
	let structurer = value
		.get_mut("providers")
		.and_then(Value::as_table_mut)
		.and_then(|providers| providers.get_mut("structurer"))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [providers.structurer].");

	structurer.insert("api_base".to_string(), Value::String("  ".to_string()));

	let path = write_temp_config(render(&value));
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(result.expect("Expected config to load.").providers.structurer.is_none());
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("atlas_config_test_missing_file.toml");
	let err = atlas_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn invalid_toml_reports_parse_error() {
	let path = write_temp_config("[service\nhttp_bind = ".to_string());
	let result = atlas_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert!(matches!(result, Err(Error::ParseConfig { .. })));
}

#[test]
fn embedding_api_key_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.embedding.api_key = " ".to_string();

	let err = atlas_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider embedding api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn provider_timeout_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.provider_timeout_ms = 0;

	let err = atlas_config::validate(&cfg).expect_err("Expected timeout validation error.");

	assert!(
		err.to_string().contains("search.provider_timeout_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn default_page_size_cannot_exceed_max() {
	let mut cfg = base_config();

	cfg.search.default_page_size = 200;

	let err = atlas_config::validate(&cfg).expect_err("Expected page size validation error.");

	assert!(
		err.to_string().contains("search.default_page_size must not exceed search.max_page_size."),
		"Unexpected error: {err}"
	);
}

#[test]
fn cache_ttl_is_only_checked_when_enabled() {
	let mut cfg = base_config();

	cfg.search.cache.ttl_secs = 0;

	assert!(atlas_config::validate(&cfg).is_err());

	cfg.search.cache.enabled = false;

	assert!(atlas_config::validate(&cfg).is_ok());
}

#[test]
fn tier_ordering_is_enforced() {
	let mut cfg = base_config();

	cfg.ranking.and_bonus = 2_000_000.0;

	let err = atlas_config::validate(&cfg).expect_err("Expected tier ordering error.");

	assert!(
		err.to_string().contains("ranking.priority_bonus must be greater than ranking.and_bonus."),
		"Unexpected error: {err}"
	);

	cfg = base_config();
	cfg.ranking.semantic_scale = 10_000.0;

	let err = atlas_config::validate(&cfg).expect_err("Expected semantic scale ordering error.");

	assert!(
		err.to_string()
			.contains("ranking.title_hit_weight must be greater than ranking.semantic_scale."),
		"Unexpected error: {err}"
	);
}

#[test]
fn semantic_weights_must_be_unit_range() {
	let mut cfg = base_config();

	cfg.ranking.semantic_threshold = 1.5;

	let err = atlas_config::validate(&cfg).expect_err("Expected threshold range error.");

	assert!(
		err.to_string().contains("ranking.semantic_threshold must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}
