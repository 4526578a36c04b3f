use std::sync::Arc;

use kbs_service::KbsService;
use kbs_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<KbsService>,
}
impl AppState {
	/// Connects the stores, bootstraps their schemas and wires the default collaborators.
	pub async fn new(config: kbs_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(&config.search.lexical_language).await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let service = KbsService::new(config, db, qdrant)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: KbsService) -> Self {
		Self { service: Arc::new(service) }
	}
}
