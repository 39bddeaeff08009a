//! Short-lived, process-scoped cache for provider output.
//!
//! Entries are keyed by a hash of the normalized query plus the provider identity, so a
//! provider or model change never serves stale shapes. Only structurer output and query
//! embeddings are cached; rankings are always computed fresh.

use std::{
	num::NonZeroUsize,
	sync::Mutex,
	time::{Duration, Instant},
};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};
use atlas_domain::text;

const STRUCTURE_CACHE_SCHEMA_VERSION: i32 = 1;
const EMBEDDING_CACHE_SCHEMA_VERSION: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
	Structure,
	QueryEmbedding,
}
impl CacheKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Structure => "structure",
			Self::QueryEmbedding => "query_embedding",
		}
	}
}

pub trait QueryCache
where
	Self: Send + Sync,
{
	fn get(&self, kind: CacheKind, key: &str) -> Option<Value>;

	fn set(&self, kind: CacheKind, key: &str, value: Value);

	/// Drops expired entries and returns how many were removed.
	fn purge_expired(&self) -> usize;
}

#[derive(Debug)]
struct CacheEntry {
	value: Value,
	expires_at: Instant,
}

/// A [`QueryCache`] held in process memory.
///
/// Capacity is bounded by an LRU list; reads refresh recency. When full, expired entries are
/// dropped before the least recently used one is evicted.
#[derive(Debug)]
pub struct MemoryCache {
	ttl: Duration,
	entries: Mutex<LruCache<(CacheKind, String), CacheEntry>>,
}
impl MemoryCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);

		Self { ttl, entries: Mutex::new(LruCache::new(capacity)) }
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl QueryCache for MemoryCache {
	fn get(&self, kind: CacheKind, key: &str) -> Option<Value> {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let map_key = (kind, key.to_string());

		if entries.peek(&map_key)?.expires_at <= now {
			entries.pop(&map_key);

			return None;
		}

		entries.get(&map_key).map(|entry| entry.value.clone())
	}

	fn set(&self, kind: CacheKind, key: &str, value: Value) {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let map_key = (kind, key.to_string());

		if !entries.contains(&map_key) && entries.len() >= entries.cap().get() {
			drop_expired(&mut entries, now);
		}

		if let Some((evicted, _)) =
			entries.push(map_key.clone(), CacheEntry { value, expires_at: now + self.ttl })
			&& evicted != map_key
		{
			tracing::debug!(
				kind = evicted.0.as_str(),
				key_prefix = cache_key_prefix(&evicted.1),
				"Cache entry evicted."
			);
		}
	}

	fn purge_expired(&self) -> usize {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		drop_expired(&mut entries, Instant::now())
	}
}

fn drop_expired(entries: &mut LruCache<(CacheKind, String), CacheEntry>, now: Instant) -> usize {
	let expired = entries
		.iter()
		.filter(|(_, entry)| entry.expires_at <= now)
		.map(|(key, _)| key.clone())
		.collect::<Vec<_>>();

	for key in &expired {
		entries.pop(key);
	}

	expired.len()
}

pub fn hash_cache_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::Storage {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

pub fn build_structure_cache_key(
	query: &str,
	provider_id: &str,
	model: &str,
	temperature: f32,
) -> Result<String> {
	let payload = serde_json::json!({
		"kind": CacheKind::Structure.as_str(),
		"schema_version": STRUCTURE_CACHE_SCHEMA_VERSION,
		"query": text::normalize(query.trim()),
		"provider_id": provider_id,
		"model": model,
		"temperature": temperature,
	});

	hash_cache_key(&payload)
}

pub fn build_query_embedding_cache_key(
	query: &str,
	provider_id: &str,
	model: &str,
	dimensions: u32,
) -> Result<String> {
	let payload = serde_json::json!({
		"kind": CacheKind::QueryEmbedding.as_str(),
		"schema_version": EMBEDDING_CACHE_SCHEMA_VERSION,
		"query": text::normalize(query.trim()),
		"provider_id": provider_id,
		"model": model,
		"dimensions": dimensions,
	});

	hash_cache_key(&payload)
}
