mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AND_BONUS, CONTENT_HIT_CAP, CONTENT_HIT_WEIGHT, Config, EmbeddingProviderConfig, PRIORITY_BONUS,
	Postgres, Providers, Ranking, RankingPriority, SEMANTIC_CONTENT_WEIGHT, SEMANTIC_SCALE,
	SEMANTIC_THRESHOLD, SEMANTIC_TITLE_WEIGHT, SNIPPET_HIT_WEIGHT, Search, SearchCache, Service,
	Storage, StructurerProviderConfig, TITLE_HIT_WEIGHT,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(validation("service.http_bind must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(validation("storage.postgres.pool_max_conns must be greater than zero."));
	}

	validate_providers(cfg)?;
	validate_search(cfg)?;
	validate_ranking(cfg)?;

	Ok(())
}

fn validate_providers(cfg: &Config) -> Result<()> {
	let embedding = &cfg.providers.embedding;

	if embedding.api_key.trim().is_empty() {
		return Err(validation("Provider embedding api_key must be non-empty."));
	}
	if embedding.dimensions == 0 {
		return Err(validation("providers.embedding.dimensions must be greater than zero."));
	}
	if embedding.timeout_ms == 0 {
		return Err(validation("providers.embedding.timeout_ms must be greater than zero."));
	}
	if embedding.batch_size == 0 {
		return Err(validation("providers.embedding.batch_size must be greater than zero."));
	}

	if let Some(structurer) = cfg.providers.structurer.as_ref() {
		if structurer.api_key.trim().is_empty() {
			return Err(validation("Provider structurer api_key must be non-empty."));
		}
		if structurer.timeout_ms == 0 {
			return Err(validation("providers.structurer.timeout_ms must be greater than zero."));
		}
		if !structurer.temperature.is_finite() || structurer.temperature < 0.0 {
			return Err(validation(
				"providers.structurer.temperature must be a finite number of zero or greater.",
			));
		}
	}

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	for (label, value) in [
		("search.candidate_limit", search.candidate_limit),
		("search.default_page_size", search.default_page_size),
		("search.max_page_size", search.max_page_size),
		("search.content_top_n", search.content_top_n),
		("search.expansion_max_pool", search.expansion_max_pool),
		("search.content_embed_chars", search.content_embed_chars),
		("search.max_keywords", search.max_keywords),
	] {
		if value == 0 {
			return Err(validation(&format!("{label} must be greater than zero.")));
		}
	}

	if search.default_page_size > search.max_page_size {
		return Err(validation("search.default_page_size must not exceed search.max_page_size."));
	}
	if search.provider_timeout_ms == 0 {
		return Err(validation("search.provider_timeout_ms must be greater than zero."));
	}
	if search.cache.enabled {
		if search.cache.ttl_secs == 0 {
			return Err(validation("search.cache.ttl_secs must be greater than zero."));
		}
		if search.cache.max_entries == 0 {
			return Err(validation("search.cache.max_entries must be greater than zero."));
		}
	}

	Ok(())
}

fn validate_ranking(cfg: &Config) -> Result<()> {
	let ranking = &cfg.ranking;

	for (label, value) in [
		("ranking.title_hit_weight", ranking.title_hit_weight),
		("ranking.snippet_hit_weight", ranking.snippet_hit_weight),
		("ranking.content_hit_weight", ranking.content_hit_weight),
		("ranking.and_bonus", ranking.and_bonus),
		("ranking.priority_bonus", ranking.priority_bonus),
		("ranking.semantic_scale", ranking.semantic_scale),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(validation(&format!("{label} must be a finite number of zero or greater.")));
		}
	}
	for (label, value) in [
		("ranking.semantic_title_weight", ranking.semantic_title_weight),
		("ranking.semantic_content_weight", ranking.semantic_content_weight),
		("ranking.semantic_threshold", ranking.semantic_threshold),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(validation(&format!("{label} must be in the range 0.0-1.0.")));
		}
	}

	if ranking.content_hit_cap == 0 {
		return Err(validation("ranking.content_hit_cap must be greater than zero."));
	}

	// Only the relative order of the tiers is load-bearing.
	if ranking.priority_bonus <= ranking.and_bonus {
		return Err(validation("ranking.priority_bonus must be greater than ranking.and_bonus."));
	}
	if ranking.and_bonus <= ranking.title_hit_weight {
		return Err(validation("ranking.and_bonus must be greater than ranking.title_hit_weight."));
	}
	if ranking.title_hit_weight <= ranking.semantic_scale {
		return Err(validation(
			"ranking.title_hit_weight must be greater than ranking.semantic_scale.",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
	if cfg
		.providers
		.structurer
		.as_ref()
		.map(|structurer| structurer.api_base.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.structurer = None;
	}

	let priority = &mut cfg.ranking.priority;

	priority.rich_kinds = normalize_labels(&priority.rich_kinds);
	priority.structured_sources = normalize_labels(&priority.structured_sources);
}

fn normalize_labels(labels: &[String]) -> Vec<String> {
	let mut out: Vec<String> = labels
		.iter()
		.map(|label| label.trim().to_lowercase())
		.filter(|label| !label.is_empty())
		.collect();

	out.sort();
	out.dedup();

	out
}

fn validation(message: &str) -> Error {
	Error::Validation { message: message.to_string() }
}
