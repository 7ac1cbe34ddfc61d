pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Sequence, StoreError, UserStore, ENTRY_ID_FIELD};

use std::sync::Arc;

use crate::config::DatabaseConfig;

/// Open the configured store: Postgres when a URL is set, memory otherwise
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn UserStore>, StoreError> {
    match config.url.as_deref() {
        Some(url) => Ok(Arc::new(PgStore::connect(url, config).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set; data will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
