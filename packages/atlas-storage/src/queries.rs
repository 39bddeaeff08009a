use sqlx::PgExecutor;

use crate::{Error, Result, models::Document};

/// Case-insensitive substring lookup over title, snippet and content.
///
/// Rows come back newest first with `id` as the tie-break, so repeated lookups against an
/// unchanged table return the same slice.
pub async fn find_by_pattern<'e, E>(
	executor: E,
	pattern: &str,
	source: Option<&str>,
	limit: u32,
) -> Result<Vec<Document>>
where
	E: PgExecutor<'e>,
{
	let pattern = pattern.trim();

	if pattern.is_empty() {
		return Err(Error::InvalidArgument("Search pattern must be non-empty.".to_string()));
	}

	let like = format!("%{}%", escape_like(pattern));
	let rows = sqlx::query_as::<_, Document>(
		"\
SELECT id, source, title, snippet, content, path, kind, updated_at
FROM documents
WHERE (title ILIKE $1 ESCAPE '\\' OR snippet ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\')
	AND ($2::text IS NULL OR source = $2)
ORDER BY updated_at DESC, id ASC
LIMIT $3",
	)
	.bind(like)
	.bind(source)
	.bind(i64::from(limit))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn count<'e, E>(executor: E, source: Option<&str>) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM documents WHERE ($1::text IS NULL OR source = $1)")
			.bind(source)
			.fetch_one(executor)
			.await?;

	Ok(count.max(0) as u64)
}

pub async fn upsert_document<'e, E>(executor: E, doc: &Document) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO documents (id, source, title, snippet, content, path, kind, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (id) DO UPDATE
SET
	source = EXCLUDED.source,
	title = EXCLUDED.title,
	snippet = EXCLUDED.snippet,
	content = EXCLUDED.content,
	path = EXCLUDED.path,
	kind = EXCLUDED.kind,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(doc.id.as_str())
	.bind(doc.source.as_str())
	.bind(doc.title.as_str())
	.bind(doc.snippet.as_str())
	.bind(doc.content.as_deref())
	.bind(doc.path.as_str())
	.bind(doc.kind.as_str())
	.bind(doc.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Escapes `LIKE` metacharacters so user input matches literally.
pub fn escape_like(input: &str) -> String {
	let mut out = String::with_capacity(input.len());

	for ch in input.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

#[cfg(test)]
mod tests {
	use super::escape_like;

	#[test]
	fn escapes_like_metacharacters() {
		assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
		assert_eq!(escape_like("로드맵"), "로드맵");
	}
}
