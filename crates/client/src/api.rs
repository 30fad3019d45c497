//! The job API the dashboard reads from, and an in-process mock of it.
//!
//! [`MockJobApi`] serves the [`EntityStore`] with the latencies of the real
//! endpoints so loading states can be observed. Failures can be injected per
//! endpoint.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jobdash_core::error::CoreError;
use jobdash_db::models::dashboard::{ChartDatum, DashboardMetrics, WeeklyActivity, DEFAULT_ACTIVITY_WEEKS};
use jobdash_db::models::offer::{CreateOffer, JobOffer};
use jobdash_db::models::source::{CreateSource, JobSource, UpdateSource};
use jobdash_db::EntityStore;
use serde::Serialize;
use tokio::sync::RwLock;

/// The entity store shared between the mock API and anything seeding it.
pub type SharedStore = Arc<RwLock<EntityStore>>;

/// Largest accepted multiplier on the simulated latencies.
pub const MAX_LATENCY_SCALE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The store rejected a mutation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{endpoint} endpoint is unavailable")]
    Unavailable { endpoint: Endpoint },
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// A read endpoint of the job API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    DashboardMetrics,
    JobSources,
    SavedOffers,
    RecentSavedOffers,
    OffersPerSource,
    ApplicationStatus,
    OffersPerWeek,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::DashboardMetrics,
        Endpoint::JobSources,
        Endpoint::SavedOffers,
        Endpoint::RecentSavedOffers,
        Endpoint::OffersPerSource,
        Endpoint::ApplicationStatus,
        Endpoint::OffersPerWeek,
    ];

    /// Response time of the real endpoint.
    pub fn latency(self) -> Duration {
        let ms = match self {
            Endpoint::DashboardMetrics => 500,
            Endpoint::JobSources => 600,
            Endpoint::SavedOffers => 700,
            Endpoint::RecentSavedOffers => 400,
            Endpoint::OffersPerSource => 800,
            Endpoint::ApplicationStatus => 600,
            Endpoint::OffersPerWeek => 700,
        };
        Duration::from_millis(ms)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::DashboardMetrics => "dashboard metrics",
            Endpoint::JobSources => "job sources",
            Endpoint::SavedOffers => "saved offers",
            Endpoint::RecentSavedOffers => "recent saved offers",
            Endpoint::OffersPerSource => "offers per source",
            Endpoint::ApplicationStatus => "application status",
            Endpoint::OffersPerWeek => "offers per week",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// JobApi
// ---------------------------------------------------------------------------

/// Everything the dashboard reads and writes.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ApiError>;
    async fn job_sources(&self) -> Result<Vec<JobSource>, ApiError>;
    async fn saved_offers(&self) -> Result<Vec<JobOffer>, ApiError>;
    async fn recent_saved_offers(&self, limit: usize) -> Result<Vec<JobOffer>, ApiError>;
    async fn offers_per_source(&self) -> Result<Vec<ChartDatum>, ApiError>;
    async fn application_status(&self) -> Result<Vec<ChartDatum>, ApiError>;
    async fn offers_per_week(&self) -> Result<Vec<WeeklyActivity>, ApiError>;

    async fn create_source(&self, input: CreateSource) -> Result<JobSource, ApiError>;
    async fn update_source(&self, id: &str, input: UpdateSource) -> Result<JobSource, ApiError>;
    async fn set_source_active(&self, id: &str, active: bool) -> Result<JobSource, ApiError>;
    async fn delete_source(&self, id: &str) -> Result<JobSource, ApiError>;
    async fn create_offer(&self, input: CreateOffer) -> Result<JobOffer, ApiError>;
    async fn delete_offer(&self, id: &str) -> Result<JobOffer, ApiError>;
    async fn apply_to_offer(&self, id: &str) -> Result<JobOffer, ApiError>;
    async fn set_offer_saved(&self, id: &str, saved: bool) -> Result<JobOffer, ApiError>;
}

// ---------------------------------------------------------------------------
// MockJobApi
// ---------------------------------------------------------------------------

/// In-process [`JobApi`] over a shared [`EntityStore`].
///
/// Reads sleep for the endpoint's latency times `latency_scale`. Writes
/// apply immediately.
pub struct MockJobApi {
    store: SharedStore,
    latency_scale: f64,
    calls: [AtomicUsize; 7],
    failing: [AtomicBool; 7],
}

impl MockJobApi {
    /// `latency_scale` is clamped to `0..=MAX_LATENCY_SCALE`; a NaN scale
    /// reads as `1`.
    pub fn new(store: SharedStore, latency_scale: f64) -> Self {
        let latency_scale = if latency_scale.is_nan() {
            1.0
        } else {
            latency_scale.clamp(0.0, MAX_LATENCY_SCALE)
        };
        Self {
            store,
            latency_scale,
            calls: Default::default(),
            failing: Default::default(),
        }
    }

    /// Number of reads served (or attempted) by `endpoint`.
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls[endpoint.index()].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        Endpoint::ALL.iter().map(|e| self.call_count(*e)).sum()
    }

    /// Make every read of `endpoint` fail until turned off again.
    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        self.failing[endpoint.index()].store(failing, Ordering::SeqCst);
    }

    async fn simulate(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.calls[endpoint.index()].fetch_add(1, Ordering::SeqCst);
        let latency = endpoint.latency().mul_f64(self.latency_scale);
        tracing::debug!(%endpoint, latency_ms = latency.as_millis() as u64, "Mock API request");
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.failing[endpoint.index()].load(Ordering::SeqCst) {
            tracing::warn!(%endpoint, "Mock API failure injected");
            return Err(ApiError::Unavailable { endpoint });
        }
        Ok(())
    }
}

#[async_trait]
impl JobApi for MockJobApi {
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ApiError> {
        self.simulate(Endpoint::DashboardMetrics).await?;
        Ok(self.store.read().await.metrics())
    }

    async fn job_sources(&self) -> Result<Vec<JobSource>, ApiError> {
        self.simulate(Endpoint::JobSources).await?;
        Ok(self.store.read().await.sources().to_vec())
    }

    async fn saved_offers(&self) -> Result<Vec<JobOffer>, ApiError> {
        self.simulate(Endpoint::SavedOffers).await?;
        Ok(self.store.read().await.saved_offers())
    }

    async fn recent_saved_offers(&self, limit: usize) -> Result<Vec<JobOffer>, ApiError> {
        self.simulate(Endpoint::RecentSavedOffers).await?;
        Ok(self.store.read().await.recent_saved_offers(limit))
    }

    async fn offers_per_source(&self) -> Result<Vec<ChartDatum>, ApiError> {
        self.simulate(Endpoint::OffersPerSource).await?;
        Ok(self.store.read().await.offers_per_source())
    }

    async fn application_status(&self) -> Result<Vec<ChartDatum>, ApiError> {
        self.simulate(Endpoint::ApplicationStatus).await?;
        Ok(self.store.read().await.application_status_data())
    }

    async fn offers_per_week(&self) -> Result<Vec<WeeklyActivity>, ApiError> {
        self.simulate(Endpoint::OffersPerWeek).await?;
        Ok(self.store.read().await.weekly_activity(DEFAULT_ACTIVITY_WEEKS))
    }

    async fn create_source(&self, input: CreateSource) -> Result<JobSource, ApiError> {
        Ok(self.store.write().await.create_source(&input)?)
    }

    async fn update_source(&self, id: &str, input: UpdateSource) -> Result<JobSource, ApiError> {
        Ok(self.store.write().await.update_source(id, &input)?)
    }

    async fn set_source_active(&self, id: &str, active: bool) -> Result<JobSource, ApiError> {
        Ok(self.store.write().await.set_source_active(id, active)?)
    }

    async fn delete_source(&self, id: &str) -> Result<JobSource, ApiError> {
        Ok(self.store.write().await.delete_source(id)?)
    }

    async fn create_offer(&self, input: CreateOffer) -> Result<JobOffer, ApiError> {
        Ok(self.store.write().await.create_offer(&input, Utc::now())?)
    }

    async fn delete_offer(&self, id: &str) -> Result<JobOffer, ApiError> {
        Ok(self.store.write().await.delete_offer(id)?)
    }

    async fn apply_to_offer(&self, id: &str) -> Result<JobOffer, ApiError> {
        Ok(self.store.write().await.apply_to_offer(id, Utc::now())?)
    }

    async fn set_offer_saved(&self, id: &str, saved: bool) -> Result<JobOffer, ApiError> {
        Ok(self.store.write().await.set_offer_saved(id, saved, Utc::now())?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn seeded_api(scale: f64) -> MockJobApi {
        let store = Arc::new(RwLock::new(EntityStore::seeded().unwrap()));
        MockJobApi::new(store, scale)
    }

    #[test]
    fn latencies_match_the_real_endpoints() {
        let ms: Vec<u128> = Endpoint::ALL.iter().map(|e| e.latency().as_millis()).collect();
        assert_eq!(ms, vec![500, 600, 700, 400, 800, 600, 700]);
    }

    #[tokio::test(start_paused = true)]
    async fn reads_take_the_endpoint_latency() {
        let api = seeded_api(1.0);
        let started = tokio::time::Instant::now();
        let sources = api.job_sources().await.unwrap();
        assert_eq!(sources.len(), 5);
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert!(started.elapsed() < Duration::from_millis(700));
        assert_eq!(api.call_count(Endpoint::JobSources), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_scale_shortens_reads() {
        let api = seeded_api(0.5);
        let started = tokio::time::Instant::now();
        api.offers_per_source().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_latency_scale_is_clamped() {
        let api = seeded_api(1e30);
        let started = tokio::time::Instant::now();
        api.job_sources().await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert!(started.elapsed() < Duration::from_secs(61));
    }

    #[tokio::test]
    async fn injected_failure_is_per_endpoint() {
        let api = seeded_api(0.0);
        api.set_failing(Endpoint::SavedOffers, true);

        assert_matches!(
            api.saved_offers().await,
            Err(ApiError::Unavailable {
                endpoint: Endpoint::SavedOffers
            })
        );
        assert!(api.job_sources().await.is_ok());

        api.set_failing(Endpoint::SavedOffers, false);
        assert_eq!(api.saved_offers().await.unwrap().len(), 12);
        assert_eq!(api.total_calls(), 3);
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let api = seeded_api(0.0);
        assert_matches!(
            api.apply_to_offer("1").await,
            Err(ApiError::Core(CoreError::Conflict(_)))
        );
        assert_matches!(
            api.delete_source("missing").await,
            Err(ApiError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn weekly_activity_uses_seeded_window() {
        let api = seeded_api(0.0);
        let weeks = api.offers_per_week().await.unwrap();
        let applied: Vec<usize> = weeks.iter().map(|w| w.applied).collect();
        assert_eq!(applied, vec![0, 0, 0, 6]);
    }

    #[test]
    fn unavailable_error_names_the_endpoint() {
        let err = ApiError::Unavailable {
            endpoint: Endpoint::OffersPerWeek,
        };
        assert_eq!(err.to_string(), "offers per week endpoint is unavailable");
    }
}
