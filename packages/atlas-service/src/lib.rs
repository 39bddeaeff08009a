pub mod cache;
pub mod search;
pub mod store;

mod error;

pub use cache::{CacheKind, MemoryCache, QueryCache};
pub use error::{Error, Result};
pub use search::{
	CandidatePool, Degradation, IndexStatus, PoolKind, QueryMode, SearchDiagnostics, SearchItem,
	SearchItemExplain, SearchRequest, SearchResponse, SearchStatus, SemanticStatus, Stage,
	StageTiming, StructureSource,
};
pub use store::{DocumentStore, MemoryStore};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use atlas_config::{Config, EmbeddingProviderConfig, StructurerProviderConfig};
use atlas_providers::{embedding, structurer};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	/// Returns one vector per input text, in input order.
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait StructuringProvider
where
	Self: Send + Sync,
{
	/// Returns the raw JSON object describing `query`.
	fn structure<'a>(
		&'a self,
		cfg: &'a StructurerProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, Result<Value>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub structurer: Arc<dyn StructuringProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		structurer: Arc<dyn StructuringProvider>,
	) -> Self {
		Self { embedding, structurer }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), structurer: provider }
	}
}

pub struct AtlasService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	pub providers: Providers,
	pub cache: Option<Arc<dyn QueryCache>>,
}
impl AtlasService {
	pub fn new(cfg: Config, store: Arc<dyn DocumentStore>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	/// Builds a service around explicit providers. The query cache follows `search.cache`.
	pub fn with_providers(cfg: Config, store: Arc<dyn DocumentStore>, providers: Providers) -> Self {
		let cache = default_cache(&cfg);

		Self { cfg, store, providers, cache }
	}

	pub fn with_cache(mut self, cache: Option<Arc<dyn QueryCache>>) -> Self {
		self.cache = cache;

		self
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
impl StructuringProvider for DefaultProviders {
	fn structure<'a>(
		&'a self,
		cfg: &'a StructurerProviderConfig,
		query: &'a str,
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(structurer::structure(cfg, query).await?) })
	}
}

fn default_cache(cfg: &Config) -> Option<Arc<dyn QueryCache>> {
	let cache_cfg = &cfg.search.cache;

	if !cache_cfg.enabled {
		return None;
	}

	let cache = MemoryCache::new(
		Duration::from_secs(cache_cfg.ttl_secs),
		cache_cfg.max_entries as usize,
	);

	Some(Arc::new(cache))
}
