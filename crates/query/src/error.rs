use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use crate::key::QueryKey;

/// Why a query did not produce a value.
///
/// `Clone` so a single failure can be handed to every caller attached to
/// the same in-flight fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("Query '{key}' failed: {cause}")]
    Fetch {
        key: QueryKey,
        cause: Arc<dyn StdError + Send + Sync>,
    },

    #[error("Query '{key}' timed out after {after:?}")]
    Timeout { key: QueryKey, after: Duration },

    #[error("Query '{key}' was aborted before it resolved")]
    Aborted { key: QueryKey },

    #[error("Query '{key}' holds a value that is not a {expected}")]
    TypeMismatch {
        key: QueryKey,
        expected: &'static str,
    },
}

impl QueryError {
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Fetch { key, .. }
            | Self::Timeout { key, .. }
            | Self::Aborted { key }
            | Self::TypeMismatch { key, .. } => key,
        }
    }

    /// The fetcher's own error, if the fetch itself failed.
    pub fn fetch_cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Fetch { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
