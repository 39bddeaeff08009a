use std::sync::RwLock;

use crate::{BoxFuture, Error, Result};
use atlas_domain::text;
use atlas_storage::{db::Db, models::Document, queries};

/// Read access to the document index.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	/// Case-insensitive substring match over title, snippet and content, newest first.
	fn find_by_pattern<'a>(
		&'a self,
		pattern: &'a str,
		source: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Document>>>;

	fn count<'a>(&'a self, source: Option<&'a str>) -> BoxFuture<'a, Result<u64>>;
}

impl DocumentStore for Db {
	fn find_by_pattern<'a>(
		&'a self,
		pattern: &'a str,
		source: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			let documents = queries::find_by_pattern(&self.pool, pattern, source, limit).await?;

			Ok(documents)
		})
	}

	fn count<'a>(&'a self, source: Option<&'a str>) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(queries::count(&self.pool, source).await?) })
	}
}

/// An in-process [`DocumentStore`] with the same matching and ordering rules as Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
	documents: RwLock<Vec<Document>>,
}
impl MemoryStore {
	pub fn new(documents: Vec<Document>) -> Self {
		let store = Self::default();

		for doc in documents {
			store.upsert(doc);
		}

		store
	}

	/// Inserts `doc`, replacing any document with the same id.
	pub fn upsert(&self, doc: Document) {
		let mut documents = self.documents.write().unwrap_or_else(|err| err.into_inner());

		match documents.iter_mut().find(|existing| existing.id == doc.id) {
			Some(existing) => *existing = doc,
			None => documents.push(doc),
		}
	}

	pub fn len(&self) -> usize {
		self.documents.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn matching(&self, pattern: &str, source: Option<&str>, limit: u32) -> Result<Vec<Document>> {
		let needle = text::normalize(pattern.trim());

		if needle.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Search pattern must be non-empty.".to_string(),
			});
		}

		let documents = self.documents.read().unwrap_or_else(|err| err.into_inner());
		let mut out: Vec<Document> = documents
			.iter()
			.filter(|doc| source.is_none_or(|source| doc.source == source))
			.filter(|doc| {
				text::normalize(&doc.title).contains(&needle)
					|| text::normalize(&doc.snippet).contains(&needle)
					|| doc
						.content
						.as_deref()
						.is_some_and(|content| text::normalize(content).contains(&needle))
			})
			.cloned()
			.collect();

		out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
		out.truncate(limit as usize);

		Ok(out)
	}
}
impl DocumentStore for MemoryStore {
	fn find_by_pattern<'a>(
		&'a self,
		pattern: &'a str,
		source: Option<&'a str>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		let result = self.matching(pattern, source, limit);

		Box::pin(async move { result })
	}

	fn count<'a>(&'a self, source: Option<&'a str>) -> BoxFuture<'a, Result<u64>> {
		let count = self
			.documents
			.read()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|doc| source.is_none_or(|source| doc.source == source))
			.count();

		Box::pin(async move { Ok(count as u64) })
	}
}
