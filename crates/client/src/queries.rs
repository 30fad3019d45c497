//! Cached dashboard reads and the mutations that keep them consistent.
//!
//! Every read goes through the [`QueryCache`] under one of the [`keys`].
//! Every mutation goes to the API first and then invalidates the keys whose
//! data it changed, so the next read refetches.

use std::sync::Arc;

use jobdash_core::view::{derive_view, ViewPage, ViewState};
use jobdash_db::models::dashboard::{ChartDatum, DashboardMetrics, WeeklyActivity};
use jobdash_db::models::offer::{CreateOffer, JobOffer};
use jobdash_db::models::source::{resolve_source, CreateSource, JobSource, UpdateSource};
use jobdash_query::{QueryCache, QueryError};
use serde::Serialize;

use crate::api::{ApiError, JobApi};
use crate::config::ClientConfig;

/// Cache keys, one per API read.
pub mod keys {
    pub const DASHBOARD_METRICS: &str = "dashboardMetrics";
    pub const JOB_SOURCES: &str = "jobSources";
    pub const SAVED_OFFERS: &str = "savedJobOffers";
    pub const RECENT_SAVED_OFFERS: &str = "recentSavedOffers";
    pub const OFFERS_PER_SOURCE: &str = "offersPerSourceData";
    pub const APPLICATION_STATUS: &str = "applicationStatusData";
    pub const OFFERS_PER_WEEK: &str = "offersPerWeekData";

    pub const ALL: &[&str] = &[
        DASHBOARD_METRICS,
        JOB_SOURCES,
        SAVED_OFFERS,
        RECENT_SAVED_OFFERS,
        OFFERS_PER_SOURCE,
        APPLICATION_STATUS,
        OFFERS_PER_WEEK,
    ];

    /// Everything derived from the source list.
    pub(crate) const SOURCE_DEPENDENT: &[&str] = &[JOB_SOURCES, DASHBOARD_METRICS, OFFERS_PER_SOURCE];

    /// Everything derived from the offer list.
    pub(crate) const OFFER_DEPENDENT: &[&str] = &[
        SAVED_OFFERS,
        RECENT_SAVED_OFFERS,
        DASHBOARD_METRICS,
        OFFERS_PER_SOURCE,
        APPLICATION_STATUS,
        OFFERS_PER_WEEK,
    ];
}

// ---------------------------------------------------------------------------
// Presentation rows
// ---------------------------------------------------------------------------

/// An offer joined with its source and display labels.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRow {
    #[serde(flatten)]
    pub offer: JobOffer,
    pub source_name: String,
    pub source_logo: String,
    pub status_label: &'static str,
    pub salary_label: String,
}

impl OfferRow {
    /// A `source_id` missing from `sources` shows as the "Unknown" source.
    pub fn new(offer: &JobOffer, sources: &[JobSource]) -> Self {
        let source = resolve_source(sources, &offer.source_id);
        Self {
            source_name: source.name.clone(),
            source_logo: source.logo.clone(),
            status_label: offer.status_label(),
            salary_label: offer.salary_label().to_string(),
            offer: offer.clone(),
        }
    }
}

/// An owned page of table rows with its pagination footer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage<R> {
    pub rows: Vec<R>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_count: usize,
    pub showing_from: usize,
    pub showing_to: usize,
}

impl<R> TablePage<R> {
    pub fn from_view<S>(view: ViewPage<'_, S>, mut map: impl FnMut(&S) -> R) -> Self {
        let (showing_from, showing_to) = view.showing_range();
        Self {
            rows: view.rows.iter().map(|row| map(*row)).collect(),
            page: view.page,
            page_size: view.page_size,
            page_count: view.page_count,
            total_count: view.total_count,
            showing_from,
            showing_to,
        }
    }
}

/// Everything on the dashboard home page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardHome {
    pub metrics: DashboardMetrics,
    pub recent_offers: Vec<OfferRow>,
    pub offers_per_source: Vec<ChartDatum>,
    pub application_status: Vec<ChartDatum>,
    pub offers_per_week: Vec<WeeklyActivity>,
}

// ---------------------------------------------------------------------------
// DashboardQueries
// ---------------------------------------------------------------------------

/// Typed, cached access to the job API. Cheap to clone.
#[derive(Clone)]
pub struct DashboardQueries {
    cache: QueryCache,
    api: Arc<dyn JobApi>,
    page_size: usize,
    recent_limit: usize,
}

impl DashboardQueries {
    pub fn new(cache: QueryCache, api: Arc<dyn JobApi>, config: &ClientConfig) -> Self {
        Self {
            cache,
            api,
            page_size: config.page_size,
            recent_limit: config.recent_offers_limit,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // -- reads -------------------------------------------------------------

    pub async fn metrics(&self) -> Result<Arc<DashboardMetrics>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::DASHBOARD_METRICS, move || async move { api.dashboard_metrics().await })
            .await
    }

    pub async fn job_sources(&self) -> Result<Arc<Vec<JobSource>>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::JOB_SOURCES, move || async move { api.job_sources().await })
            .await
    }

    pub async fn saved_offers(&self) -> Result<Arc<Vec<JobOffer>>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::SAVED_OFFERS, move || async move { api.saved_offers().await })
            .await
    }

    pub async fn recent_saved_offers(&self) -> Result<Arc<Vec<JobOffer>>, QueryError> {
        let api = Arc::clone(&self.api);
        let limit = self.recent_limit;
        self.cache
            .get(keys::RECENT_SAVED_OFFERS, move || async move {
                api.recent_saved_offers(limit).await
            })
            .await
    }

    pub async fn offers_per_source(&self) -> Result<Arc<Vec<ChartDatum>>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::OFFERS_PER_SOURCE, move || async move { api.offers_per_source().await })
            .await
    }

    pub async fn application_status(&self) -> Result<Arc<Vec<ChartDatum>>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::APPLICATION_STATUS, move || async move { api.application_status().await })
            .await
    }

    pub async fn offers_per_week(&self) -> Result<Arc<Vec<WeeklyActivity>>, QueryError> {
        let api = Arc::clone(&self.api);
        self.cache
            .get(keys::OFFERS_PER_WEEK, move || async move { api.offers_per_week().await })
            .await
    }

    /// The source list, or an empty one when it cannot be loaded.
    ///
    /// Joins only need sources for names and logos; offers whose source is
    /// missing render as "Unknown".
    async fn sources_for_join(&self) -> Arc<Vec<JobSource>> {
        match self.job_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::warn!(error = %e, "Rendering offers without sources");
                Arc::new(Vec::new())
            }
        }
    }

    /// The saved offers table for `view`, joined with sources.
    pub async fn saved_offers_view(&self, view: &ViewState) -> Result<TablePage<OfferRow>, QueryError> {
        let (offers, sources) = futures::join!(self.saved_offers(), self.sources_for_join());
        let offers = offers?;

        let page = derive_view(offers.as_slice(), view, self.page_size);
        Ok(TablePage::from_view(page, |offer| OfferRow::new(offer, &sources)))
    }

    /// The sources table for `view`.
    pub async fn sources_view(&self, view: &ViewState) -> Result<TablePage<JobSource>, QueryError> {
        let sources = self.job_sources().await?;
        let page = derive_view(sources.as_slice(), view, self.page_size);
        Ok(TablePage::from_view(page, JobSource::clone))
    }

    /// The home page "Recent saved offers" card.
    pub async fn recent_offer_rows(&self) -> Result<Vec<OfferRow>, QueryError> {
        let (offers, sources) = futures::join!(self.recent_saved_offers(), self.sources_for_join());
        Ok(offers?
            .iter()
            .map(|offer| OfferRow::new(offer, &sources))
            .collect())
    }

    /// Load the whole home page. All queries run concurrently.
    pub async fn home(&self) -> Result<DashboardHome, QueryError> {
        let (metrics, recent_offers, per_source, status, per_week) = futures::try_join!(
            self.metrics(),
            self.recent_offer_rows(),
            self.offers_per_source(),
            self.application_status(),
            self.offers_per_week(),
        )?;

        Ok(DashboardHome {
            metrics: *metrics,
            recent_offers,
            offers_per_source: per_source.as_ref().clone(),
            application_status: status.as_ref().clone(),
            offers_per_week: per_week.as_ref().clone(),
        })
    }

    /// Mark every dashboard query stale ("Refresh").
    pub async fn refresh_all(&self) {
        self.invalidate(keys::ALL).await;
    }

    async fn invalidate(&self, keys: &[&str]) {
        for key in keys {
            self.cache.invalidate(*key).await;
        }
    }

    // -- source mutations --------------------------------------------------

    pub async fn create_source(&self, input: CreateSource) -> Result<JobSource, ApiError> {
        let source = self.api.create_source(input).await?;
        self.invalidate(keys::SOURCE_DEPENDENT).await;
        Ok(source)
    }

    pub async fn update_source(&self, id: &str, input: UpdateSource) -> Result<JobSource, ApiError> {
        let source = self.api.update_source(id, input).await?;
        self.invalidate(keys::SOURCE_DEPENDENT).await;
        Ok(source)
    }

    /// Toggle a source. A settled cached source list is patched in place.
    pub async fn set_source_active(&self, id: &str, active: bool) -> Result<JobSource, ApiError> {
        let updated = self.api.set_source_active(id, active).await?;

        let patched = match self.cache.snapshot::<Vec<JobSource>>(keys::JOB_SOURCES).await {
            Ok(snapshot) if !snapshot.is_fetching => snapshot.data.map(|current| {
                current
                    .iter()
                    .map(|s| if s.id == updated.id { updated.clone() } else { s.clone() })
                    .collect::<Vec<_>>()
            }),
            _ => None,
        };
        match patched {
            Some(sources) => {
                self.cache.set_data(keys::JOB_SOURCES, sources).await;
            }
            None => {
                self.cache.invalidate(keys::JOB_SOURCES).await;
            }
        }
        self.cache.invalidate(keys::DASHBOARD_METRICS).await;
        Ok(updated)
    }

    pub async fn delete_source(&self, id: &str) -> Result<JobSource, ApiError> {
        let source = self.api.delete_source(id).await?;
        self.invalidate(keys::SOURCE_DEPENDENT).await;
        Ok(source)
    }

    // -- offer mutations ---------------------------------------------------

    pub async fn create_offer(&self, input: CreateOffer) -> Result<JobOffer, ApiError> {
        let offer = self.api.create_offer(input).await?;
        self.invalidate(keys::OFFER_DEPENDENT).await;
        Ok(offer)
    }

    pub async fn delete_offer(&self, id: &str) -> Result<JobOffer, ApiError> {
        let offer = self.api.delete_offer(id).await?;
        self.invalidate(keys::OFFER_DEPENDENT).await;
        Ok(offer)
    }

    pub async fn apply_to_offer(&self, id: &str) -> Result<JobOffer, ApiError> {
        let offer = self.api.apply_to_offer(id).await?;
        self.invalidate(keys::OFFER_DEPENDENT).await;
        Ok(offer)
    }

    /// Save or un-save ("Remove from saved") an offer.
    pub async fn set_offer_saved(&self, id: &str, saved: bool) -> Result<JobOffer, ApiError> {
        let offer = self.api.set_offer_saved(id, saved).await?;
        self.invalidate(keys::OFFER_DEPENDENT).await;
        Ok(offer)
    }
}
