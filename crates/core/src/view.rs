//! Tabular view derivation: text filter, status filter, sort, paginate.
//!
//! Every function in this module is pure. The caller owns the [`ViewState`]
//! and hands it in on every recompute; the engine keeps nothing between
//! calls. Malformed state never produces an error: an unknown sort column
//! leaves rows in their filtered order, page `0` is read as page `1`, and a
//! page past the end yields an empty slice.

use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Rows per page used by the saved-offers table.
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Column the saved-offers table sorts by until the user picks another.
pub const DEFAULT_SORT_COLUMN: &str = "createdAt";

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Direction of a column sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Orient an ascending comparison result according to this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Which column to sort by, and in which direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub column: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, SortDirection::Descending)
    }
}

/// Categorical filter on application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Applied,
    NotApplied,
}

impl StatusFilter {
    /// Whether a row with the given application status passes this filter.
    ///
    /// `None` means the row has no notion of application status; such rows
    /// pass every filter.
    pub fn admits(self, applied: Option<bool>) -> bool {
        match (self, applied) {
            (StatusFilter::All, _) | (_, None) => true,
            (StatusFilter::Applied, Some(applied)) => applied,
            (StatusFilter::NotApplied, Some(applied)) => !applied,
        }
    }

    /// Label shown on the status dropdown button.
    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Applied => "Applied",
            StatusFilter::NotApplied => "Not Applied",
        }
    }
}

/// Everything the user controls about what a list view displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub filter_text: String,
    pub status_filter: StatusFilter,
    pub sort: SortDescriptor,
    /// 1-based page number.
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            status_filter: StatusFilter::All,
            sort: SortDescriptor::descending(DEFAULT_SORT_COLUMN),
            page: 1,
        }
    }
}

impl ViewState {
    pub fn with_filter_text(mut self, text: impl Into<String>) -> Self {
        self.filter_text = text.into();
        self
    }

    pub fn with_status_filter(mut self, filter: StatusFilter) -> Self {
        self.status_filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: SortDescriptor) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Apply a click on a sortable column header.
    ///
    /// Clicking the current column flips its direction; clicking another
    /// column sorts by it ascending.
    pub fn toggle_sort(&mut self, column: &str) {
        if self.sort.column == column {
            self.sort.direction = self.sort.direction.flipped();
        } else {
            self.sort = SortDescriptor::ascending(column);
        }
    }

    /// Pull `page` back into `1..=page_count` (or `1` when there are no pages).
    pub fn clamp_page(&mut self, page_count: usize) {
        self.page = self.page.clamp(1, page_count.max(1));
    }
}

// ---------------------------------------------------------------------------
// Rows and the per-column comparator table
// ---------------------------------------------------------------------------

/// A comparable cell value.
///
/// Within one column every row yields the same variant, so comparisons
/// never cross types. The derived ordering (variant first, then payload)
/// keeps the result deterministic if a table ever mixes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue<'a> {
    Flag(bool),
    Number(i64),
    Text(&'a str),
    Time(Timestamp),
}

/// One entry of a row type's comparator table.
pub struct ColumnSpec<R> {
    /// Column key as sent by the presentation layer (e.g. `"createdAt"`).
    pub key: &'static str,
    /// Extract the sort key; `None` means the value is absent.
    pub value: fn(&R) -> Option<SortValue<'_>>,
}

/// A record that can be shown in a filterable, sortable table.
pub trait TableRow: Sized + 'static {
    /// The comparator table: every sortable column and its key extractor.
    fn columns() -> &'static [ColumnSpec<Self>];

    /// Fields searched by the free-text filter.
    fn search_fields(&self) -> Vec<&str>;

    /// `Some(applied)` for rows that carry an application status.
    fn application_status(&self) -> Option<bool> {
        None
    }
}

/// Look up a column in the comparator table of `R`.
pub fn find_column<R: TableRow>(key: &str) -> Option<&'static ColumnSpec<R>> {
    R::columns().iter().find(|c| c.key == key)
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Case-insensitive substring match of an already lowercased needle. An
/// empty needle matches every row.
fn contains_needle<R: TableRow>(row: &R, needle: &str) -> bool {
    needle.is_empty()
        || row
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Run the text filter and then the status filter, preserving input order.
pub fn filter_rows<'a, R: TableRow>(
    rows: &'a [R],
    filter_text: &str,
    status_filter: StatusFilter,
) -> Vec<&'a R> {
    let needle = filter_text.to_lowercase();
    rows.iter()
        .filter(|row| contains_needle(*row, &needle))
        .filter(|row| status_filter.admits(row.application_status()))
        .collect()
}

/// Three-way compare of two optional sort keys.
///
/// Present keys compare in `direction`; absent keys always go last, whatever
/// the direction.
pub fn compare_values(
    a: Option<SortValue<'_>>,
    b: Option<SortValue<'_>>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by the descriptor's column. Unknown columns leave `rows` as is.
pub fn sort_rows<R: TableRow>(rows: &mut [&R], sort: &SortDescriptor) {
    let Some(column) = find_column::<R>(&sort.column) else {
        return;
    };
    // `sort_by` is stable: equal keys keep their filtered order.
    rows.sort_by(|a, b| compare_values((column.value)(a), (column.value)(b), sort.direction));
}

/// `ceil(total / page_size)`; a zero page size falls back to the default.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(effective_page_size(page_size))
}

/// Index range of `page` (1-based) within `total` rows.
///
/// Pages past the end produce an empty range at `total`.
pub fn page_bounds(page: usize, page_size: usize, total: usize) -> Range<usize> {
    let size = effective_page_size(page_size);
    let start = page.max(1).saturating_sub(1).saturating_mul(size).min(total);
    let end = start.saturating_add(size).min(total);
    start..end
}

fn effective_page_size(page_size: usize) -> usize {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

// ---------------------------------------------------------------------------
// Full derivation
// ---------------------------------------------------------------------------

/// The rows to render plus pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPage<'a, R> {
    pub rows: Vec<&'a R>,
    /// The page these rows belong to (page `0` is reported as `1`).
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    /// Number of rows left after filtering, across all pages.
    pub total_count: usize,
}

impl<R> ViewPage<'_, R> {
    /// 1-based `(first, last)` row numbers for a "Showing X to Y of N" label.
    ///
    /// Both are `0` when nothing matched; past the last page both collapse
    /// onto `total_count`.
    pub fn showing_range(&self) -> (usize, usize) {
        let first = self
            .page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .saturating_add(1)
            .min(self.total_count);
        let last = self.page.saturating_mul(self.page_size).min(self.total_count);
        (first, last)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derive the visible page of `rows` for `state`.
///
/// Stages run in a fixed order: text filter, status filter, stable sort,
/// pagination. The same inputs always produce the same output.
pub fn derive_view<'a, R: TableRow>(
    rows: &'a [R],
    state: &ViewState,
    page_size: usize,
) -> ViewPage<'a, R> {
    let page_size = effective_page_size(page_size);
    let page = state.page.max(1);

    let mut filtered = filter_rows(rows, &state.filter_text, state.status_filter);
    sort_rows(&mut filtered, &state.sort);

    let total_count = filtered.len();
    let bounds = page_bounds(page, page_size, total_count);
    let visible = filtered[bounds].to_vec();

    ViewPage {
        rows: visible,
        page,
        page_size,
        page_count: page_count(total_count, page_size),
        total_count,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
