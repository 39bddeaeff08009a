pub const INIT_SQL: &str = include_str!("../../../sql/init.sql");

/// Splits the bootstrap script into individual statements.
pub fn statements() -> impl Iterator<Item = &'static str> {
	INIT_SQL.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	#[test]
	fn bootstrap_creates_documents_table_and_trigram_indexes() {
		let statements = super::statements().collect::<Vec<_>>();

		assert!(statements[0].starts_with("CREATE EXTENSION IF NOT EXISTS pg_trgm"));
		assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS documents")));
		assert_eq!(statements.iter().filter(|s| s.contains("gin_trgm_ops")).count(), 3);
	}
}
