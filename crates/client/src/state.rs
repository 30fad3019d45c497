use std::sync::Arc;

use jobdash_core::error::CoreError;
use jobdash_db::EntityStore;
use jobdash_query::QueryCache;
use tokio::sync::RwLock;

use crate::api::{JobApi, MockJobApi, SharedStore};
use crate::config::ClientConfig;
use crate::queries::DashboardQueries;

/// Everything a dashboard session needs, wired together.
///
/// Cheap to clone; every field is behind an `Arc` or is itself a shared
/// handle.
#[derive(Clone)]
pub struct DashboardState {
    pub config: Arc<ClientConfig>,
    /// The authoritative entities behind the mock API.
    pub store: SharedStore,
    /// Kept concrete so callers can inspect call counts and inject failures.
    pub api: Arc<MockJobApi>,
    pub queries: DashboardQueries,
}

impl DashboardState {
    /// A session over `store`, with a fresh cache.
    pub fn new(config: ClientConfig, store: EntityStore) -> Self {
        let store: SharedStore = Arc::new(RwLock::new(store));
        let api = Arc::new(MockJobApi::new(Arc::clone(&store), config.mock_latency_scale));
        let cache = QueryCache::new(config.query_options());
        let queries = DashboardQueries::new(cache, Arc::clone(&api) as Arc<dyn JobApi>, &config);

        tracing::debug!(
            page_size = config.page_size,
            stale_time_ms = config.stale_time.as_millis() as u64,
            "Dashboard state created"
        );

        Self {
            config: Arc::new(config),
            store,
            api,
            queries,
        }
    }

    /// A session over the mock data set.
    pub fn seeded(config: ClientConfig) -> Result<Self, CoreError> {
        Ok(Self::new(config, EntityStore::seeded()?))
    }
}
