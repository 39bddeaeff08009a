use std::sync::Arc;

use atlas_service::AtlasService;
use atlas_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<AtlasService>,
}
impl AppState {
	/// Connects to Postgres, bootstraps the schema and builds the service with live providers.
	pub async fn new(config: atlas_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = AtlasService::new(config, Arc::new(db));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: AtlasService) -> Self {
		Self { service: Arc::new(service) }
	}
}
