//! Job source entity model and DTOs.

use std::borrow::Cow;

use jobdash_core::error::CoreError;
use jobdash_core::types::EntityId;
use jobdash_core::view::{ColumnSpec, SortValue, TableRow};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name shown for an offer whose source id does not resolve.
pub const FALLBACK_SOURCE_NAME: &str = "Unknown";

/// Generic icon used when a source is unknown or has no logo of its own.
pub const FALLBACK_SOURCE_LOGO: &str = "lucide:briefcase";

/// Maximum length of a source name.
const MAX_NAME_LEN: usize = 100;

/// Maximum length of a source description.
const MAX_DESCRIPTION_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A job board or site that offers are collected from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSource {
    pub id: EntityId,
    pub name: String,
    pub url: String,
    /// Icon reference, e.g. `"logos:linkedin-icon"`.
    pub logo: String,
    pub description: String,
    pub active: bool,
    /// Number of offers the board reported. Never edited through the DTOs.
    pub offers_count: u32,
}

impl JobSource {
    /// The placeholder substituted for a source id that does not resolve.
    pub fn unknown(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            name: FALLBACK_SOURCE_NAME.to_string(),
            url: String::new(),
            logo: FALLBACK_SOURCE_LOGO.to_string(),
            description: String::new(),
            active: false,
            offers_count: 0,
        }
    }
}

/// DTO for creating a new source from the "Add Source" form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSource {
    pub name: String,
    pub url: String,
    /// Defaults to the generic icon if omitted.
    pub logo: Option<String>,
    pub description: Option<String>,
    /// Defaults to `true` if omitted.
    pub active: Option<bool>,
}

/// DTO for editing a source. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSource {
    pub name: Option<String>,
    pub url: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Source name must not be empty".into()));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Source name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_url(url: &str) -> Result<(), CoreError> {
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(CoreError::Validation(format!(
            "Source URL must start with http:// or https://, got '{url}'"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), CoreError> {
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "Source description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the "Add Source" form input.
pub fn validate_create_source(input: &CreateSource) -> Result<(), CoreError> {
    validate_name(&input.name)?;
    validate_url(&input.url)?;
    if let Some(description) = &input.description {
        validate_description(description)?;
    }
    Ok(())
}

/// Validate the "Edit Source" form input. Only present fields are checked.
pub fn validate_update_source(input: &UpdateSource) -> Result<(), CoreError> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    if let Some(url) = &input.url {
        validate_url(url)?;
    }
    if let Some(description) = &input.description {
        validate_description(description)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Resolve `source_id` against `sources`, falling back to
/// [`JobSource::unknown`] when nothing matches.
///
/// Sources and offers are fetched independently and may be briefly out of
/// sync, so a miss is never an error.
pub fn resolve_source<'a>(sources: &'a [JobSource], source_id: &str) -> Cow<'a, JobSource> {
    match sources.iter().find(|s| s.id == source_id) {
        Some(source) => Cow::Borrowed(source),
        None => Cow::Owned(JobSource::unknown(source_id)),
    }
}

// ---------------------------------------------------------------------------
// Table columns
// ---------------------------------------------------------------------------

fn name_key(s: &JobSource) -> Option<SortValue<'_>> {
    Some(SortValue::Text(&s.name))
}

fn url_key(s: &JobSource) -> Option<SortValue<'_>> {
    Some(SortValue::Text(&s.url))
}

fn active_key(s: &JobSource) -> Option<SortValue<'_>> {
    Some(SortValue::Flag(s.active))
}

fn offers_count_key(s: &JobSource) -> Option<SortValue<'_>> {
    Some(SortValue::Number(i64::from(s.offers_count)))
}

const SOURCE_COLUMNS: &[ColumnSpec<JobSource>] = &[
    ColumnSpec { key: "name", value: name_key },
    ColumnSpec { key: "url", value: url_key },
    ColumnSpec { key: "active", value: active_key },
    ColumnSpec { key: "offersCount", value: offers_count_key },
];

impl TableRow for JobSource {
    fn columns() -> &'static [ColumnSpec<Self>] {
        SOURCE_COLUMNS
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.url, &self.description]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
