//! Status transition stream backed by a `tokio::sync::broadcast` channel.
//!
//! Every [`QueryCache`](crate::QueryCache) owns a [`QueryEventBus`]; call
//! [`QueryCache::subscribe`](crate::QueryCache::subscribe) to follow the
//! lifecycle of every key.

use chrono::Utc;
use jobdash_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::key::QueryKey;

// ---------------------------------------------------------------------------
// QueryEvent
// ---------------------------------------------------------------------------

/// What happened to a cache line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum QueryEventKind {
    /// A fetch started.
    Loading,
    /// A value was stored, by a fetch or by a direct write.
    Success,
    /// A fetch failed; `message` is the error's display text.
    Error { message: String },
    /// The line was marked stale and will be refetched on next read.
    Invalidated,
    /// The line was dropped from the cache.
    Removed,
}

/// A status transition on one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEvent {
    pub key: QueryKey,
    pub kind: QueryEventKind,
    pub timestamp: Timestamp,
}

impl QueryEvent {
    pub fn new(key: QueryKey, kind: QueryEventKind) -> Self {
        Self {
            key,
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// QueryEventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of [`QueryEvent`]s. Cloning shares the channel.
#[derive(Clone)]
pub struct QueryEventBus {
    sender: broadcast::Sender<QueryEvent>,
}

impl QueryEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: QueryEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for QueryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for QueryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = QueryEventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        bus.publish(QueryEvent::new("jobSources".into(), QueryEventKind::Loading));

        assert_eq!(rx1.recv().await.unwrap().kind, QueryEventKind::Loading);
        let event = rx2.recv().await.unwrap();
        assert_eq!(event.key.as_str(), "jobSources");
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = QueryEventBus::default();
        bus.publish(QueryEvent::new("jobSources".into(), QueryEventKind::Removed));
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = QueryEventBus::new(8);
        let _rx = bus.clone().subscribe();
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn event_kind_is_tagged() {
        let event = QueryEvent::new(
            "dashboardMetrics".into(),
            QueryEventKind::Error {
                message: "boom".into(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "error");
        assert_eq!(json["kind"]["message"], "boom");
        assert_eq!(json["key"], "dashboardMetrics");
    }
}
