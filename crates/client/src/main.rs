use jobdash_client::config::ClientConfig;
use jobdash_client::state::DashboardState;
use jobdash_core::view::{SortDescriptor, StatusFilter, ViewState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobdash_client=debug,jobdash_query=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env()?;
    tracing::info!(
        page_size = config.page_size,
        stale_time_ms = config.stale_time.as_millis() as u64,
        latency_scale = config.mock_latency_scale,
        "Loaded client configuration"
    );

    // --- State ---
    let state = DashboardState::seeded(config)?;

    // Log every cache transition while the demo runs.
    let mut events = state.queries.cache().subscribe();
    let event_log = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(key = %event.key, kind = ?event.kind, "Query event");
        }
    });

    // --- Home page ---
    let home = state.queries.home().await?;
    println!("{}", serde_json::to_string_pretty(&home)?);

    // --- Saved offers: applied, newest first ---
    let applied = ViewState::default()
        .with_status_filter(StatusFilter::Applied)
        .with_sort(SortDescriptor::descending("createdAt"));
    let page = state.queries.saved_offers_view(&applied).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    // --- Sources by offer count ---
    let by_count = ViewState::default().with_sort(SortDescriptor::descending("offersCount"));
    let sources = state.queries.sources_view(&by_count).await?;
    println!("{}", serde_json::to_string_pretty(&sources)?);

    // --- Apply and re-read ---
    let offer = state.queries.apply_to_offer("3").await?;
    tracing::info!(offer_id = %offer.id, "Applied to offer");
    let metrics = state.queries.metrics().await?;
    println!("{}", serde_json::to_string_pretty(&*metrics)?);

    tracing::info!(api_calls = state.api.total_calls(), "Dashboard demo finished");
    event_log.abort();
    Ok(())
}
