use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::recommendations::RecommendationService;
use crate::storage::FileStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Resume and profile image objects.
    pub storage: Arc<dyn FileStorage>,
    pub recommender: Arc<RecommendationService>,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State for router tests. The pool never connects unless a handler
    /// actually queries it.
    pub fn for_tests(recommender: RecommendationService) -> Self {
        let config = Config::for_tests();
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();

        AppState {
            db,
            storage: Arc::new(crate::storage::test_support::MemoryStorage::default()),
            recommender: Arc::new(recommender),
            config,
        }
    }
}
