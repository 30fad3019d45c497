//! Derived dashboard aggregates: headline metrics and chart series.
//!
//! Nothing here is stored. Every value is recomputed from the current
//! source and offer collections, so it is exactly as fresh as its inputs.

use jobdash_core::types::Timestamp;
use serde::{Deserialize, Serialize};

use super::offer::{JobOffer, APPLIED_LABEL, NOT_APPLIED_LABEL};
use super::source::JobSource;

/// Number of weekly buckets on the "offers per week" chart.
pub const DEFAULT_ACTIVITY_WEEKS: usize = 4;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Applied versus not-applied offer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusCounts {
    pub applied: usize,
    pub not_applied: usize,
}

impl ApplicationStatusCounts {
    pub fn total(&self) -> usize {
        self.applied + self.not_applied
    }

    /// Share of offers applied to, rounded to a whole percent (0 when empty).
    pub fn completion_percent(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.applied as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Headline numbers on the dashboard home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_saved_offers: usize,
    pub total_sources: usize,
    pub active_sources_count: usize,
    pub application_status_counts: ApplicationStatusCounts,
}

impl DashboardMetrics {
    pub fn compute(sources: &[JobSource], offers: &[JobOffer]) -> Self {
        let applied = offers.iter().filter(|o| o.is_applied()).count();
        Self {
            total_saved_offers: offers.iter().filter(|o| o.is_saved).count(),
            total_sources: sources.len(),
            active_sources_count: sources.iter().filter(|s| s.active).count(),
            application_status_counts: ApplicationStatusCounts {
                applied,
                not_applied: offers.len() - applied,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// One named value on a bar or pie chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub name: String,
    pub value: usize,
}

impl ChartDatum {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Saved and applied counts for one week on the activity line chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    pub name: String,
    pub saved: usize,
    pub applied: usize,
}

/// Offers referencing each source, in source order.
pub fn offers_per_source(sources: &[JobSource], offers: &[JobOffer]) -> Vec<ChartDatum> {
    sources
        .iter()
        .map(|source| {
            let count = offers.iter().filter(|o| o.source_id == source.id).count();
            ChartDatum::new(source.name.clone(), count)
        })
        .collect()
}

/// The two-slice application status pie: `Applied` then `Not Applied`.
pub fn application_status_data(offers: &[JobOffer]) -> Vec<ChartDatum> {
    let applied = offers.iter().filter(|o| o.is_applied()).count();
    vec![
        ChartDatum::new(APPLIED_LABEL, applied),
        ChartDatum::new(NOT_APPLIED_LABEL, offers.len() - applied),
    ]
}

/// Most recent save or apply timestamp in the collection.
pub fn latest_activity(offers: &[JobOffer]) -> Option<Timestamp> {
    offers
        .iter()
        .flat_map(|o| std::iter::once(o.created_at).chain(o.applied_at))
        .max()
}

/// Bucket saves and applications into `weeks` seven-day windows ending at
/// `as_of`, oldest first.
///
/// Each window is half-open on the left: `(start, start + 7 days]`, so an
/// event exactly at `as_of` lands in the last week.
pub fn weekly_activity(offers: &[JobOffer], weeks: usize, as_of: Timestamp) -> Vec<WeeklyActivity> {
    (0..weeks)
        .map(|i| {
            let weeks_back = (weeks - i) as i64;
            let start = as_of - chrono::Duration::days(7 * weeks_back);
            let end = start + chrono::Duration::days(7);
            let in_window = |t: Timestamp| t > start && t <= end;

            WeeklyActivity {
                name: format!("Week {}", i + 1),
                saved: offers
                    .iter()
                    .filter(|o| o.is_saved && in_window(o.created_at))
                    .count(),
                applied: offers
                    .iter()
                    .filter(|o| o.applied_at.is_some_and(|t| in_window(t)))
                    .count(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
