//! Mutation tests: each write must invalidate exactly the reads it affects.

mod common;

use assert_matches::assert_matches;
use jobdash_client::api::{ApiError, Endpoint};
use jobdash_client::queries::keys;
use jobdash_core::error::CoreError;
use jobdash_core::view::{SortDescriptor, StatusFilter, ViewState};
use jobdash_db::models::offer::CreateOffer;
use jobdash_db::models::source::{CreateSource, UpdateSource};
use jobdash_query::QueryEventKind;

use common::{offer_ids, seeded_state};

// ---------------------------------------------------------------------------
// Test: deleting a source shows its offers as "Unknown"
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn deleted_source_shows_as_unknown() {
    let state = seeded_state();
    let by_title = ViewState::default().with_sort(SortDescriptor::ascending("title"));
    state.queries.saved_offers_view(&by_title).await.unwrap();

    state.queries.delete_source("2").await.unwrap();

    let page = state.queries.saved_offers_view(&by_title).await.unwrap();
    // Page 1 by title holds one Indeed offer, "Backend Engineer".
    let unknown: Vec<&str> = page
        .rows
        .iter()
        .filter(|r| r.source_name == "Unknown")
        .map(|r| r.offer.id.as_str())
        .collect();
    assert_eq!(unknown, vec!["2"]);
    assert_eq!(state.api.call_count(Endpoint::JobSources), 2);
    // Offers themselves were not refetched.
    assert_eq!(state.api.call_count(Endpoint::SavedOffers), 1);
}

// ---------------------------------------------------------------------------
// Test: creating a source invalidates the source list and metrics
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn create_source_refetches_sources_and_metrics() {
    let state = seeded_state();
    state.queries.home().await.unwrap();
    state.queries.job_sources().await.unwrap();

    let created = state
        .queries
        .create_source(CreateSource {
            name: "Remote OK".into(),
            url: "https://remoteok.com".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.offers_count, 0);

    let sources = state.queries.job_sources().await.unwrap();
    assert!(sources.iter().any(|s| s.id == created.id));
    let metrics = state.queries.metrics().await.unwrap();
    assert_eq!((metrics.total_sources, metrics.active_sources_count), (6, 5));

    assert_eq!(state.api.call_count(Endpoint::JobSources), 2);
    assert_eq!(state.api.call_count(Endpoint::DashboardMetrics), 2);
    // Offer-derived charts are untouched.
    assert_eq!(state.api.call_count(Endpoint::ApplicationStatus), 1);
}

// ---------------------------------------------------------------------------
// Test: invalid input is rejected before anything is invalidated
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn invalid_source_is_rejected() {
    let state = seeded_state();
    state.queries.job_sources().await.unwrap();
    let mut events = state.queries.cache().subscribe();

    let result = state
        .queries
        .update_source(
            "1",
            UpdateSource {
                url: Some("linkedin.com".into()),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(ApiError::Core(CoreError::Validation(_))));
    assert!(events.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: toggling a source patches the cached list without a refetch
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn toggle_source_patches_cached_list() {
    let state = seeded_state();
    state.queries.job_sources().await.unwrap();
    state.queries.metrics().await.unwrap();

    state.queries.set_source_active("3", true).await.unwrap();

    let sources = state.queries.job_sources().await.unwrap();
    assert!(sources.iter().all(|s| s.active));
    assert_eq!(state.api.call_count(Endpoint::JobSources), 1);

    let metrics = state.queries.metrics().await.unwrap();
    assert_eq!(metrics.active_sources_count, 5);
    assert_eq!(state.api.call_count(Endpoint::DashboardMetrics), 2);
}

// ---------------------------------------------------------------------------
// Test: applying moves an offer to the applied view and updates metrics
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn apply_updates_views_and_metrics() {
    let state = seeded_state();
    let applied = ViewState::default().with_status_filter(StatusFilter::Applied);
    state.queries.saved_offers_view(&applied).await.unwrap();
    state.queries.metrics().await.unwrap();

    let mut events = state.queries.cache().subscribe();
    let offer = state.queries.apply_to_offer("10").await.unwrap();
    assert!(offer.applied_at.is_some());

    let mut invalidated = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.kind == QueryEventKind::Invalidated {
            invalidated.push(event.key.to_string());
        }
    }
    // Only keys that were cached are reported.
    assert_eq!(invalidated, vec![keys::SAVED_OFFERS, keys::DASHBOARD_METRICS]);

    let page = state.queries.saved_offers_view(&applied).await.unwrap();
    assert_eq!(offer_ids(&page)[0], "10");
    assert_eq!(page.total_count, 7);

    let metrics = state.queries.metrics().await.unwrap();
    assert_eq!(metrics.application_status_counts.applied, 7);

    assert_matches!(
        state.queries.apply_to_offer("10").await,
        Err(ApiError::Core(CoreError::Conflict(_)))
    );
}

// ---------------------------------------------------------------------------
// Test: un-saving removes an offer from every saved list
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unsave_removes_from_saved_lists() {
    let state = seeded_state();
    state.queries.home().await.unwrap();

    state.queries.set_offer_saved("10", false).await.unwrap();

    let home = state.queries.home().await.unwrap();
    let recent: Vec<&str> = home.recent_offers.iter().map(|r| r.offer.id.as_str()).collect();
    assert_eq!(recent, vec!["12", "8", "7", "6", "11"]);
    assert_eq!(home.metrics.total_saved_offers, 11);

    let page = state.queries.saved_offers_view(&ViewState::default()).await.unwrap();
    assert_eq!(page.total_count, 11);
}

// ---------------------------------------------------------------------------
// Test: a new offer needs an existing source and shows up first
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn create_offer_appears_newest_first() {
    let state = seeded_state();
    let input = CreateOffer {
        title: "Rust Engineer".into(),
        company: "Ferrous Systems".into(),
        location: "Berlin (Remote)".into(),
        source_id: "99".into(),
        url: "https://example.com/job/rust".into(),
        ..Default::default()
    };

    assert_matches!(
        state.queries.create_offer(input.clone()).await,
        Err(ApiError::Core(CoreError::NotFound { .. }))
    );

    let created = state
        .queries
        .create_offer(CreateOffer {
            source_id: "4".into(),
            ..input
        })
        .await
        .unwrap();

    let page = state.queries.saved_offers_view(&ViewState::default()).await.unwrap();
    assert_eq!(page.rows[0].offer.id, created.id);
    assert_eq!(page.rows[0].source_name, "AngelList");
    assert_eq!(page.rows[0].salary_label, "Not specified");
    assert_eq!(page.total_count, 13);
}

// ---------------------------------------------------------------------------
// Test: refresh marks every cached query stale
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn refresh_all_refetches_everything() {
    let state = seeded_state();
    state.queries.home().await.unwrap();
    assert_eq!(state.api.total_calls(), 6);

    state.queries.refresh_all().await;
    state.queries.home().await.unwrap();
    assert_eq!(state.api.total_calls(), 12);
}
