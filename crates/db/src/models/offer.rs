//! Job offer entity model and DTOs.

use jobdash_core::error::CoreError;
use jobdash_core::types::{EntityId, Timestamp};
use jobdash_core::view::{ColumnSpec, SortValue, TableRow};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Status label for offers that have been applied to.
pub const APPLIED_LABEL: &str = "Applied";

/// Status label for offers that have not been applied to yet.
pub const NOT_APPLIED_LABEL: &str = "Not Applied";

/// Salary label for offers that do not state one.
pub const SALARY_NOT_SPECIFIED: &str = "Not specified";

/// Maximum length of an offer title, company or location.
const MAX_FIELD_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A job offer collected from a [`JobSource`](super::source::JobSource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOffer {
    pub id: EntityId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
    /// References `JobSource::id`. May dangle after a source is deleted.
    pub source_id: EntityId,
    pub url: String,
    pub is_saved: bool,
    /// Set once when the user applies; never cleared.
    pub applied_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobOffer {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_applied() {
            APPLIED_LABEL
        } else {
            NOT_APPLIED_LABEL
        }
    }

    pub fn salary_label(&self) -> &str {
        self.salary.as_deref().unwrap_or(SALARY_NOT_SPECIFIED)
    }
}

/// DTO for saving a new offer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOffer {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub source_id: EntityId,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_required(field: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("Offer {field} must not be empty")));
    }
    if trimmed.len() > MAX_FIELD_LEN {
        return Err(CoreError::Validation(format!(
            "Offer {field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate new-offer input. Source existence is checked by the store.
pub fn validate_create_offer(input: &CreateOffer) -> Result<(), CoreError> {
    validate_required("title", &input.title)?;
    validate_required("company", &input.company)?;
    validate_required("location", &input.location)?;
    if input.source_id.trim().is_empty() {
        return Err(CoreError::Validation("Offer source_id must not be empty".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Table columns
// ---------------------------------------------------------------------------

fn title_key(o: &JobOffer) -> Option<SortValue<'_>> {
    Some(SortValue::Text(&o.title))
}

fn company_key(o: &JobOffer) -> Option<SortValue<'_>> {
    Some(SortValue::Text(&o.company))
}

fn location_key(o: &JobOffer) -> Option<SortValue<'_>> {
    Some(SortValue::Text(&o.location))
}

fn salary_key(o: &JobOffer) -> Option<SortValue<'_>> {
    o.salary.as_deref().map(SortValue::Text)
}

fn created_at_key(o: &JobOffer) -> Option<SortValue<'_>> {
    Some(SortValue::Time(o.created_at))
}

fn updated_at_key(o: &JobOffer) -> Option<SortValue<'_>> {
    Some(SortValue::Time(o.updated_at))
}

fn applied_at_key(o: &JobOffer) -> Option<SortValue<'_>> {
    o.applied_at.map(SortValue::Time)
}

/// `savedAt` is the "Date saved" column; it shows and sorts by `createdAt`.
const OFFER_COLUMNS: &[ColumnSpec<JobOffer>] = &[
    ColumnSpec { key: "title", value: title_key },
    ColumnSpec { key: "company", value: company_key },
    ColumnSpec { key: "location", value: location_key },
    ColumnSpec { key: "salary", value: salary_key },
    ColumnSpec { key: "createdAt", value: created_at_key },
    ColumnSpec { key: "savedAt", value: created_at_key },
    ColumnSpec { key: "updatedAt", value: updated_at_key },
    ColumnSpec { key: "appliedAt", value: applied_at_key },
];

impl TableRow for JobOffer {
    fn columns() -> &'static [ColumnSpec<Self>] {
        OFFER_COLUMNS
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.company, &self.location]
    }

    fn application_status(&self) -> Option<bool> {
        Some(self.is_applied())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use jobdash_core::view::{derive_view, SortDescriptor, ViewState};

    use super::*;

    fn offer(id: &str, title: &str, salary: Option<&str>, applied_day: Option<u32>) -> JobOffer {
        let created = Utc.with_ymd_and_hms(2023, 11, 10, 8, 0, 0).unwrap();
        JobOffer {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary: salary.map(str::to_string),
            description: String::new(),
            source_id: "1".to_string(),
            url: format!("https://example.com/job/{id}"),
            is_saved: true,
            applied_at: applied_day.map(|d| Utc.with_ymd_and_hms(2023, 11, d, 9, 0, 0).unwrap()),
            created_at: created,
            updated_at: created,
        }
    }

    fn ids(rows: &[&JobOffer]) -> Vec<String> {
        rows.iter().map(|o| o.id.clone()).collect()
    }

    #[test]
    fn labels_follow_application_and_salary() {
        let applied = offer("1", "Dev", Some("$100k"), Some(15));
        assert_eq!(applied.status_label(), "Applied");
        assert_eq!(applied.salary_label(), "$100k");

        let open = offer("2", "Dev", None, None);
        assert_eq!(open.status_label(), "Not Applied");
        assert_eq!(open.salary_label(), "Not specified");
    }

    #[test]
    fn missing_salary_sorts_last_in_both_directions() {
        let offers = vec![
            offer("1", "A", None, None),
            offer("2", "B", Some("$90k"), None),
            offer("3", "C", Some("$120k"), None),
        ];
        let asc = derive_view(
            &offers,
            &ViewState::default().with_sort(SortDescriptor::ascending("salary")),
            10,
        );
        assert_eq!(ids(&asc.rows), vec!["3", "2", "1"]);

        let desc = derive_view(
            &offers,
            &ViewState::default().with_sort(SortDescriptor::descending("salary")),
            10,
        );
        assert_eq!(ids(&desc.rows), vec!["2", "3", "1"]);
    }

    #[test]
    fn applied_at_sort_puts_unapplied_last() {
        let offers = vec![
            offer("1", "A", None, None),
            offer("2", "B", None, Some(20)),
            offer("3", "C", None, Some(18)),
        ];
        let desc = derive_view(
            &offers,
            &ViewState::default().with_sort(SortDescriptor::descending("appliedAt")),
            10,
        );
        assert_eq!(ids(&desc.rows), vec!["2", "3", "1"]);
    }

    #[test]
    fn saved_at_is_an_alias_of_created_at() {
        let mut offers = vec![offer("1", "A", None, None), offer("2", "B", None, None)];
        offers[0].created_at = Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap();
        let by_saved = derive_view(
            &offers,
            &ViewState::default().with_sort(SortDescriptor::ascending("savedAt")),
            10,
        );
        assert_eq!(ids(&by_saved.rows), vec!["2", "1"]);
    }

    #[test]
    fn search_covers_title_company_and_location_only() {
        let mut offers = vec![offer("1", "Backend Engineer", None, None)];
        offers[0].description = "kubernetes".into();
        let hit = derive_view(&offers, &ViewState::default().with_filter_text("REMOTE"), 6);
        assert_eq!(hit.total_count, 1);
        let miss = derive_view(&offers, &ViewState::default().with_filter_text("kubernetes"), 6);
        assert_eq!(miss.total_count, 0);
    }

    #[test]
    fn create_offer_requires_title_company_location_and_source() {
        let mut input = CreateOffer {
            title: "Dev".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            source_id: "1".into(),
            ..Default::default()
        };
        assert!(validate_create_offer(&input).is_ok());

        input.company = " ".into();
        assert_matches!(validate_create_offer(&input), Err(CoreError::Validation(_)));

        input.company = "Acme".into();
        input.source_id = String::new();
        assert_matches!(validate_create_offer(&input), Err(CoreError::Validation(_)));
    }

    #[test]
    fn offer_round_trips_with_null_applied_at() {
        let json = serde_json::to_value(offer("1", "Dev", None, None)).unwrap();
        assert!(json["appliedAt"].is_null());
        assert_eq!(json["sourceId"], "1");
        let back: JobOffer = serde_json::from_value(json).unwrap();
        assert!(!back.is_applied());
    }
}
