use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A harvested document as stored in the index.
///
/// `content` is `None` until text extraction has run for the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
	pub id: String,
	pub source: String,
	pub title: String,
	#[serde(default)]
	pub snippet: String,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default)]
	pub path: String,
	#[serde(default)]
	pub kind: String,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
