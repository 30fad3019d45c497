//! Lifecycle status of a cache line.

use serde::{Deserialize, Serialize};

/// Where a cache line is in its fetch lifecycle.
///
/// A line that is refetching keeps its previous value while `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryStatus {
    /// Never fetched, or removed.
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&QueryStatus::Loading).unwrap(), "\"loading\"");
    }
}
