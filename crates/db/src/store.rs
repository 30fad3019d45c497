//! The authoritative in-memory collections of sources and offers.
//!
//! All mutation is synchronous and local. Collections keep insertion order,
//! which is the order the dashboard lists them in before any sort.

use std::borrow::Cow;

use chrono::Utc;
use jobdash_core::error::CoreError;
use jobdash_core::types::Timestamp;

use crate::models::dashboard::{
    self, ChartDatum, DashboardMetrics, WeeklyActivity,
};
use crate::models::offer::{validate_create_offer, CreateOffer, JobOffer};
use crate::models::source::{
    resolve_source, validate_create_source, validate_update_source, CreateSource, JobSource,
    UpdateSource, FALLBACK_SOURCE_LOGO,
};
use crate::seed;

/// Number of offers shown in the home page "Recent saved offers" card.
pub const DEFAULT_RECENT_OFFERS: usize = 5;

const SOURCE: &str = "job_source";
const OFFER: &str = "job_offer";

/// In-memory entity store. Wrap it in a lock to share it between tasks.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    sources: Vec<JobSource>,
    offers: Vec<JobOffer>,
}

impl EntityStore {
    pub fn new(sources: Vec<JobSource>, offers: Vec<JobOffer>) -> Self {
        Self { sources, offers }
    }

    /// A store loaded with the mock data set.
    pub fn seeded() -> Result<Self, CoreError> {
        let offers = seed::job_offers()
            .map_err(|e| CoreError::Internal(format!("Invalid seed timestamp: {e}")))?;
        Ok(Self::new(seed::job_sources(), offers))
    }

    // -- reads -------------------------------------------------------------

    pub fn sources(&self) -> &[JobSource] {
        &self.sources
    }

    pub fn offers(&self) -> &[JobOffer] {
        &self.offers
    }

    pub fn find_source(&self, id: &str) -> Option<&JobSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn find_offer(&self, id: &str) -> Option<&JobOffer> {
        self.offers.iter().find(|o| o.id == id)
    }

    /// The source an offer points at, or the "Unknown" placeholder.
    pub fn source_lookup(&self, source_id: &str) -> Cow<'_, JobSource> {
        resolve_source(&self.sources, source_id)
    }

    /// Offers the user has saved, in store order.
    pub fn saved_offers(&self) -> Vec<JobOffer> {
        self.offers.iter().filter(|o| o.is_saved).cloned().collect()
    }

    /// The `limit` most recently created saved offers, newest first.
    pub fn recent_saved_offers(&self, limit: usize) -> Vec<JobOffer> {
        let mut saved = self.saved_offers();
        saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        saved.truncate(limit);
        saved
    }

    pub fn metrics(&self) -> DashboardMetrics {
        DashboardMetrics::compute(&self.sources, &self.offers)
    }

    pub fn offers_per_source(&self) -> Vec<ChartDatum> {
        dashboard::offers_per_source(&self.sources, &self.offers)
    }

    pub fn application_status_data(&self) -> Vec<ChartDatum> {
        dashboard::application_status_data(&self.offers)
    }

    /// Weekly activity ending at the most recent save or apply.
    pub fn weekly_activity(&self, weeks: usize) -> Vec<WeeklyActivity> {
        let as_of = dashboard::latest_activity(&self.offers).unwrap_or_else(Utc::now);
        dashboard::weekly_activity(&self.offers, weeks, as_of)
    }

    // -- source mutations --------------------------------------------------

    /// Add a source from form input. New sources start with zero offers.
    pub fn create_source(&mut self, input: &CreateSource) -> Result<JobSource, CoreError> {
        validate_create_source(input)?;

        let source = JobSource {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            url: input.url.trim().to_string(),
            logo: input
                .logo
                .clone()
                .unwrap_or_else(|| FALLBACK_SOURCE_LOGO.to_string()),
            description: input.description.clone().unwrap_or_default(),
            active: input.active.unwrap_or(true),
            offers_count: 0,
        };
        self.sources.push(source.clone());

        tracing::info!(source_id = %source.id, name = %source.name, "Job source created");
        Ok(source)
    }

    /// Apply an edit. Only `Some` fields change; `offers_count` never does.
    pub fn update_source(&mut self, id: &str, input: &UpdateSource) -> Result<JobSource, CoreError> {
        validate_update_source(input)?;

        let source = self.source_mut(id)?;
        if let Some(name) = &input.name {
            source.name = name.trim().to_string();
        }
        if let Some(url) = &input.url {
            source.url = url.trim().to_string();
        }
        if let Some(logo) = &input.logo {
            source.logo = logo.clone();
        }
        if let Some(description) = &input.description {
            source.description = description.clone();
        }
        if let Some(active) = input.active {
            source.active = active;
        }

        tracing::info!(source_id = %id, "Job source updated");
        Ok(source.clone())
    }

    pub fn set_source_active(&mut self, id: &str, active: bool) -> Result<JobSource, CoreError> {
        let source = self.source_mut(id)?;
        source.active = active;
        tracing::debug!(source_id = %id, active, "Job source toggled");
        Ok(source.clone())
    }

    /// Replace the source with the same id, or append it. Returns `true` when
    /// the source was new.
    pub fn upsert_source(&mut self, source: JobSource) -> bool {
        match self.sources.iter_mut().find(|s| s.id == source.id) {
            Some(existing) => {
                *existing = source;
                false
            }
            None => {
                self.sources.push(source);
                true
            }
        }
    }

    /// Remove a source. Offers that referenced it are kept and will resolve
    /// to the "Unknown" source.
    pub fn delete_source(&mut self, id: &str) -> Result<JobSource, CoreError> {
        let index = self
            .sources
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found(SOURCE, id))?;
        let removed = self.sources.remove(index);

        let orphaned = self.offers.iter().filter(|o| o.source_id == id).count();
        tracing::info!(source_id = %id, orphaned, "Job source deleted");
        Ok(removed)
    }

    // -- offer mutations ---------------------------------------------------

    /// Save a new offer. The referenced source must exist at creation time.
    pub fn create_offer(&mut self, input: &CreateOffer, now: Timestamp) -> Result<JobOffer, CoreError> {
        validate_create_offer(input)?;
        if self.find_source(&input.source_id).is_none() {
            return Err(CoreError::not_found(SOURCE, input.source_id.clone()));
        }

        let offer = JobOffer {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            company: input.company.trim().to_string(),
            location: input.location.trim().to_string(),
            salary: input.salary.clone().filter(|s| !s.trim().is_empty()),
            description: input.description.clone().unwrap_or_default(),
            source_id: input.source_id.clone(),
            url: input.url.clone(),
            is_saved: true,
            applied_at: None,
            created_at: now,
            updated_at: now,
        };
        self.offers.push(offer.clone());

        tracing::info!(offer_id = %offer.id, source_id = %offer.source_id, "Job offer saved");
        Ok(offer)
    }

    /// Replace the offer with the same id, or append it. Returns `true` when
    /// the offer was new.
    pub fn upsert_offer(&mut self, offer: JobOffer) -> bool {
        match self.offers.iter_mut().find(|o| o.id == offer.id) {
            Some(existing) => {
                *existing = offer;
                false
            }
            None => {
                self.offers.push(offer);
                true
            }
        }
    }

    pub fn delete_offer(&mut self, id: &str) -> Result<JobOffer, CoreError> {
        let index = self
            .offers
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| CoreError::not_found(OFFER, id))?;
        let removed = self.offers.remove(index);
        tracing::info!(offer_id = %id, "Job offer deleted");
        Ok(removed)
    }

    /// Record an application. `applied_at` is set once and never cleared.
    pub fn apply_to_offer(&mut self, id: &str, at: Timestamp) -> Result<JobOffer, CoreError> {
        let offer = self.offer_mut(id)?;
        if let Some(applied_at) = offer.applied_at {
            return Err(CoreError::Conflict(format!(
                "Offer {id} was already applied to at {}",
                applied_at.to_rfc3339()
            )));
        }
        offer.applied_at = Some(at);
        offer.updated_at = at;

        tracing::info!(offer_id = %id, "Applied to job offer");
        Ok(offer.clone())
    }

    /// Save or un-save an offer ("Remove from saved").
    pub fn set_offer_saved(&mut self, id: &str, saved: bool, now: Timestamp) -> Result<JobOffer, CoreError> {
        let offer = self.offer_mut(id)?;
        if offer.is_saved != saved {
            offer.is_saved = saved;
            offer.updated_at = now;
        }
        tracing::debug!(offer_id = %id, saved, "Job offer saved flag set");
        Ok(offer.clone())
    }

    fn source_mut(&mut self, id: &str) -> Result<&mut JobSource, CoreError> {
        self.sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::not_found(SOURCE, id))
    }

    fn offer_mut(&mut self, id: &str) -> Result<&mut JobOffer, CoreError> {
        self.offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| CoreError::not_found(OFFER, id))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2023, 11, 25, 12, 0, 0).unwrap()
    }

    #[test]
    fn seeded_store_has_mock_data() {
        let store = EntityStore::seeded().unwrap();
        assert_eq!(store.sources().len(), 5);
        assert_eq!(store.offers().len(), 12);
        assert_eq!(store.saved_offers().len(), 12);
    }

    #[test]
    fn recent_saved_offers_are_newest_first() {
        let store = EntityStore::seeded().unwrap();
        let recent: Vec<String> = store
            .recent_saved_offers(DEFAULT_RECENT_OFFERS)
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(recent, vec!["10", "12", "8", "7", "6"]);
    }

    #[test]
    fn unsaved_offers_drop_out_of_saved_lists() {
        let mut store = EntityStore::seeded().unwrap();
        store.set_offer_saved("10", false, now()).unwrap();
        assert_eq!(store.saved_offers().len(), 11);
        assert_eq!(store.recent_saved_offers(1)[0].id, "12");
        assert_eq!(store.metrics().total_saved_offers, 11);
    }

    #[test]
    fn apply_sets_applied_at_once() {
        let mut store = EntityStore::seeded().unwrap();
        let applied = store.apply_to_offer("3", now()).unwrap();
        assert_eq!(applied.applied_at, Some(now()));
        assert_eq!(applied.updated_at, now());

        assert_matches!(store.apply_to_offer("3", now()), Err(CoreError::Conflict(_)));
        assert_matches!(
            store.apply_to_offer("nope", now()),
            Err(CoreError::NotFound { entity: "job_offer", .. })
        );
    }

    #[test]
    fn deleted_source_resolves_to_unknown() {
        let mut store = EntityStore::seeded().unwrap();
        store.delete_source("3").unwrap();

        let lookup = store.source_lookup("3");
        assert_eq!(lookup.name, "Unknown");
        assert_eq!(lookup.logo, FALLBACK_SOURCE_LOGO);
        // The offers that pointed at it are untouched.
        assert_eq!(store.find_offer("6").unwrap().source_id, "3");
    }

    #[test]
    fn create_source_starts_with_zero_offers() {
        let mut store = EntityStore::default();
        let source = store
            .create_source(&CreateSource {
                name: " Remote OK ".into(),
                url: "https://remoteok.com".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(source.name, "Remote OK");
        assert_eq!(source.offers_count, 0);
        assert!(source.active);
        assert_eq!(source.logo, FALLBACK_SOURCE_LOGO);
        assert_eq!(store.find_source(&source.id), Some(&source));
    }

    #[test]
    fn update_source_keeps_offers_count() {
        let mut store = EntityStore::seeded().unwrap();
        let updated = store
            .update_source(
                "1",
                &UpdateSource {
                    name: Some("LinkedIn Jobs".into()),
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "LinkedIn Jobs");
        assert!(!updated.active);
        assert_eq!(updated.offers_count, 124);
        assert_eq!(store.metrics().active_sources_count, 3);
    }

    #[test]
    fn toggling_active_is_independent() {
        let mut store = EntityStore::seeded().unwrap();
        store.set_source_active("3", true).unwrap();
        assert_eq!(store.metrics().active_sources_count, 5);
        assert_matches!(store.set_source_active("9", true), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn create_offer_requires_existing_source() {
        let mut store = EntityStore::seeded().unwrap();
        let input = CreateOffer {
            title: "Rust Engineer".into(),
            company: "Ferrous Systems".into(),
            location: "Berlin".into(),
            salary: Some("  ".into()),
            source_id: "42".into(),
            url: "https://example.com/job/rust".into(),
            ..Default::default()
        };
        assert_matches!(
            store.create_offer(&input, now()),
            Err(CoreError::NotFound { entity: "job_source", .. })
        );

        let input = CreateOffer {
            source_id: "1".into(),
            ..input
        };
        let offer = store.create_offer(&input, now()).unwrap();
        assert!(offer.is_saved);
        assert!(offer.salary.is_none());
        assert_eq!(store.recent_saved_offers(1)[0].id, offer.id);
    }

    #[test]
    fn upsert_replaces_or_appends() {
        let mut store = EntityStore::seeded().unwrap();
        let mut offer = store.find_offer("1").unwrap().clone();
        offer.title = "Staff Frontend Developer".into();
        assert!(!store.upsert_offer(offer));
        assert_eq!(store.find_offer("1").unwrap().title, "Staff Frontend Developer");
        assert_eq!(store.offers().len(), 12);

        assert!(store.upsert_source(JobSource::unknown("6")));
        assert_eq!(store.sources().len(), 6);
    }

    #[test]
    fn delete_offer_removes_by_id() {
        let mut store = EntityStore::seeded().unwrap();
        let removed = store.delete_offer("2").unwrap();
        assert_eq!(removed.title, "Backend Engineer");
        assert!(store.find_offer("2").is_none());
        assert_matches!(store.delete_offer("2"), Err(CoreError::NotFound { .. }));
    }
}
