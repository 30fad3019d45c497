use chrono::{Duration, TimeZone, Utc};
use jobdash_client::config::ClientConfig;
use jobdash_client::queries::{OfferRow, TablePage};
use jobdash_client::state::DashboardState;
use jobdash_db::models::offer::CreateOffer;
use jobdash_db::EntityStore;

/// Configuration with the real latencies and defaults. Tests run on a
/// paused clock, so latencies cost nothing.
pub fn test_config() -> ClientConfig {
    ClientConfig::default()
}

/// A dashboard session over the mock data set.
pub fn seeded_state() -> DashboardState {
    DashboardState::seeded(test_config()).expect("seed data parses")
}

/// The mock data set plus `extra` applied offers, all newer than the seed.
///
/// Returns the session and the new offer ids, oldest first.
#[allow(dead_code)]
pub fn state_with_extra_applied(extra: usize) -> (DashboardState, Vec<String>) {
    let mut store = EntityStore::seeded().expect("seed data parses");
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

    let ids = (0..extra)
        .map(|i| {
            let at = base + Duration::days(i as i64);
            let input = CreateOffer {
                title: format!("Platform Engineer {i}"),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                salary: None,
                description: None,
                source_id: "1".to_string(),
                url: format!("https://jobs.example.com/{i}"),
            };
            let offer = store.create_offer(&input, at).expect("offer is valid");
            store.apply_to_offer(&offer.id, at).expect("offer exists");
            offer.id
        })
        .collect();

    (DashboardState::new(test_config(), store), ids)
}

pub fn offer_ids(page: &TablePage<OfferRow>) -> Vec<&str> {
    page.rows.iter().map(|row| row.offer.id.as_str()).collect()
}
