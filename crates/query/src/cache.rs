//! The query cache.
//!
//! Each key owns one cache line. A read either returns the fresh cached
//! value, joins the fetch already in flight for that key, or starts a new
//! fetch. Fetches run as spawned tasks, so a caller that stops waiting does
//! not stop the fetch; its result still lands in the cache.
//!
//! There is never more than one live fetch per key. Invalidating or removing
//! a key aborts its fetch, and the replacement fetch does not start until the
//! aborted one has been torn down. Callers that were waiting on the aborted
//! fetch follow the replacement.
//!
//! Values are stored type-erased and downcast on the way out. Reading a key
//! with a different type than it was written with is a
//! [`QueryError::TypeMismatch`].

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jobdash_core::types::Timestamp;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::QueryError;
use crate::events::{QueryEvent, QueryEventBus, QueryEventKind};
use crate::key::QueryKey;
use crate::status::QueryStatus;

/// Freshness window used when none is configured: five minutes.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(300);

type AnyValue = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyValue, QueryError>;
type Slot = watch::Receiver<Option<Resolution>>;

// ---------------------------------------------------------------------------
// Options and snapshots
// ---------------------------------------------------------------------------

/// Per-read fetch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful value is served without refetching.
    pub stale_time: Duration,
    /// Give up on a fetch after this long and record a timeout error.
    pub fetch_timeout: Option<Duration>,
}

impl QueryOptions {
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            fetch_timeout: None,
        }
    }
}

/// Read-only view of one cache line.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub key: QueryKey,
    pub status: QueryStatus,
    /// The last successful value. Kept while a refetch is loading, cleared
    /// by an error.
    pub data: Option<Arc<T>>,
    pub error: Option<QueryError>,
    /// Wall-clock time of the last resolution.
    pub updated_at: Option<Timestamp>,
    /// `true` when the next read will refetch.
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl<T> QuerySnapshot<T> {
    fn idle(key: QueryKey) -> Self {
        Self {
            key,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            is_stale: true,
            is_fetching: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache lines
// ---------------------------------------------------------------------------

/// How a fetch ended, as seen by the callers attached to it.
#[derive(Clone)]
enum Resolution {
    Done(FetchResult),
    /// Aborted by `invalidate`, `remove` or `clear`.
    Superseded,
}

/// A fetch that callers can attach to. The slot is filled exactly once.
struct InFlight {
    id: u64,
    slot: Slot,
    abort: AbortHandle,
}

#[derive(Default)]
struct Entry {
    status: QueryStatus,
    value: Option<AnyValue>,
    error: Option<QueryError>,
    fetched_at: Option<Instant>,
    stale_after: Option<Instant>,
    updated_at: Option<Timestamp>,
    invalidated: bool,
    in_flight: Option<InFlight>,
}

impl Entry {
    fn is_fresh(&self, stale_time: Duration, now: Instant) -> bool {
        self.status == QueryStatus::Success
            && !self.invalidated
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < stale_time)
    }

    fn is_stale(&self, now: Instant) -> bool {
        self.invalidated || self.stale_after.map_or(true, |at| now >= at)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    /// Aborted fetches that may not have been torn down yet. The next fetch
    /// for the key waits for them.
    retiring: HashMap<QueryKey, InFlight>,
    next_fetch_id: u64,
}

impl CacheState {
    fn retire(&mut self, key: QueryKey, in_flight: InFlight) {
        in_flight.abort.abort();
        self.retiring.insert(key, in_flight);
    }
}

/// What a read decided to do while holding the lock.
enum Plan {
    Hit(AnyValue),
    Join(Slot),
    Fetch { id: u64, slot: Slot },
}

// ---------------------------------------------------------------------------
// QueryCache
// ---------------------------------------------------------------------------

/// Keyed cache of asynchronous fetches.
///
/// Cheap to clone; clones share the same lines and event stream.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), jobdash_query::QueryError> {
/// use jobdash_query::QueryCache;
///
/// let cache = QueryCache::default();
/// let sources = cache
///     .get("jobSources", || async { Ok::<_, std::io::Error>(vec!["LinkedIn"]) })
///     .await?;
/// assert_eq!(sources.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
    events: QueryEventBus,
    defaults: QueryOptions,
}

impl QueryCache {
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            events: QueryEventBus::default(),
            defaults,
        }
    }

    /// Read `key` with the default options.
    pub async fn get<T, E, F, Fut>(
        &self,
        key: impl Into<QueryKey>,
        fetcher: F,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.get_with(key, self.defaults, fetcher).await
    }

    /// Read `key`, fetching with `fetcher` only when there is neither a fresh
    /// value nor a fetch already in flight.
    ///
    /// Every caller attached to one fetch receives the same resolution. The
    /// line only turns `Loading` once `fetcher` has returned its future, so a
    /// fetcher that panics leaves the line as it was.
    pub async fn get_with<T, E, F, Fut>(
        &self,
        key: impl Into<QueryKey>,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key = key.into();

        let plan = {
            let mut state = self.state.lock().await;
            let CacheState {
                entries,
                retiring,
                next_fetch_id,
            } = &mut *state;
            let entry = entries.entry(key.clone()).or_default();

            let fresh = entry
                .is_fresh(options.stale_time, Instant::now())
                .then(|| entry.value.clone())
                .flatten();

            if let Some(value) = fresh {
                Plan::Hit(value)
            } else if let Some(in_flight) = &entry.in_flight {
                Plan::Join(in_flight.slot.clone())
            } else {
                let fetch = fetcher();
                let id = *next_fetch_id;
                *next_fetch_id += 1;

                let previous = retiring.remove(&key).map(|retired| retired.slot);
                let (slot, abort) = self.spawn_fetch(key.clone(), id, options, fetch, previous);
                entry.status = QueryStatus::Loading;
                entry.in_flight = Some(InFlight {
                    id,
                    slot: slot.clone(),
                    abort,
                });
                self.events
                    .publish(QueryEvent::new(key.clone(), QueryEventKind::Loading));
                Plan::Fetch { id, slot }
            }
        };

        let slot = match plan {
            Plan::Hit(value) => {
                tracing::debug!(key = %key, "Query cache hit");
                return downcast(&key, value);
            }
            Plan::Join(slot) => {
                tracing::debug!(key = %key, "Joining in-flight query");
                slot
            }
            Plan::Fetch { id, slot } => {
                tracing::debug!(key = %key, fetch_id = id, "Started query fetch");
                slot
            }
        };

        let value = self.wait_for_result(&key, slot).await?;
        downcast(&key, value)
    }

    /// Mark `key` stale so the next read refetches.
    ///
    /// A fetch already in flight is aborted. Callers waiting on it follow
    /// the next fetch for the key, or get [`QueryError::Aborted`] if none has
    /// started by the time the aborted fetch is torn down. Returns `false`
    /// when the key was never cached.
    pub async fn invalidate(&self, key: impl Into<QueryKey>) -> bool {
        let key = key.into();
        let mut state = self.state.lock().await;
        let Some(entry) = state.entries.get_mut(&key) else {
            return false;
        };

        entry.invalidated = true;
        if let Some(in_flight) = entry.in_flight.take() {
            entry.status = if entry.value.is_some() {
                QueryStatus::Success
            } else {
                QueryStatus::Idle
            };
            state.retire(key.clone(), in_flight);
        }
        self.events
            .publish(QueryEvent::new(key.clone(), QueryEventKind::Invalidated));
        tracing::debug!(key = %key, "Query invalidated");
        true
    }

    /// Store `value` under `key` as a fresh success.
    pub async fn set_data<T>(&self, key: impl Into<QueryKey>, value: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        let value = Arc::new(value);
        let stored: AnyValue = Arc::clone(&value) as AnyValue;

        let mut state = self.state.lock().await;
        let entry = state.entries.entry(key.clone()).or_default();
        let now = Instant::now();
        entry.value = Some(stored);
        entry.error = None;
        entry.fetched_at = Some(now);
        entry.stale_after = Some(now + self.defaults.stale_time);
        entry.updated_at = Some(Utc::now());
        entry.invalidated = false;
        if entry.in_flight.is_none() {
            entry.status = QueryStatus::Success;
        }
        self.events
            .publish(QueryEvent::new(key.clone(), QueryEventKind::Success));
        tracing::debug!(key = %key, "Query data set directly");
        value
    }

    /// Typed view of the line for `key`. An unknown key is `Idle`.
    pub async fn snapshot<T>(&self, key: impl Into<QueryKey>) -> Result<QuerySnapshot<T>, QueryError>
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        let state = self.state.lock().await;
        let Some(entry) = state.entries.get(&key) else {
            return Ok(QuerySnapshot::idle(key));
        };

        let data = match &entry.value {
            Some(value) => Some(downcast::<T>(&key, Arc::clone(value))?),
            None => None,
        };
        Ok(QuerySnapshot {
            status: entry.status,
            data,
            error: entry.error.clone(),
            updated_at: entry.updated_at,
            is_stale: entry.is_stale(Instant::now()),
            is_fetching: entry.in_flight.is_some(),
            key,
        })
    }

    pub async fn status(&self, key: impl Into<QueryKey>) -> QueryStatus {
        let key = key.into();
        let state = self.state.lock().await;
        state
            .entries
            .get(&key)
            .map_or(QueryStatus::Idle, |entry| entry.status)
    }

    /// Drop the line for `key`, aborting its fetch if one is in flight.
    pub async fn remove(&self, key: impl Into<QueryKey>) -> bool {
        let key = key.into();
        let removed = {
            let mut state = self.state.lock().await;
            match state.entries.remove(&key) {
                Some(entry) => {
                    if let Some(in_flight) = entry.in_flight {
                        state.retire(key.clone(), in_flight);
                    }
                    true
                }
                None => false,
            }
        };
        if removed {
            self.events
                .publish(QueryEvent::new(key.clone(), QueryEventKind::Removed));
            tracing::debug!(key = %key, "Query removed");
        }
        removed
    }

    /// Drop every line.
    pub async fn clear(&self) {
        let drained: Vec<QueryKey> = {
            let mut state = self.state.lock().await;
            let entries: Vec<(QueryKey, Entry)> = state.entries.drain().collect();
            entries
                .into_iter()
                .map(|(key, entry)| {
                    if let Some(in_flight) = entry.in_flight {
                        state.retire(key.clone(), in_flight);
                    }
                    key
                })
                .collect()
        };
        for key in &drained {
            self.events
                .publish(QueryEvent::new(key.clone(), QueryEventKind::Removed));
        }
        tracing::debug!(removed = drained.len(), "Query cache cleared");
    }

    /// Keys currently held, sorted.
    pub async fn keys(&self) -> Vec<QueryKey> {
        let state = self.state.lock().await;
        let mut keys: Vec<QueryKey> = state.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Follow status transitions on every key.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryEvent> {
        self.events.subscribe()
    }

    // -- fetch lifecycle ---------------------------------------------------

    /// Spawn the fetch. It waits for `previous`, an aborted fetch of the same
    /// key, to be torn down before polling `fetch`.
    fn spawn_fetch<T, E, Fut>(
        &self,
        key: QueryKey,
        id: u64,
        options: QueryOptions,
        fetch: Fut,
        previous: Option<Slot>,
    ) -> (Slot, AbortHandle)
    where
        T: Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (sender, slot) = watch::channel(None);
        let fetch_key = key.clone();
        let predecessor = previous.clone();
        let run = async move {
            if let Some(previous) = predecessor {
                wait_settled(previous).await;
            }
            let result = match options.fetch_timeout {
                Some(limit) => match tokio::time::timeout(limit, fetch).await {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(QueryError::Timeout {
                            key: fetch_key,
                            after: limit,
                        })
                    }
                },
                None => fetch.await,
            };
            result
                .map(|value| Arc::new(value) as AnyValue)
                .map_err(|e| QueryError::Fetch {
                    key: fetch_key,
                    cause: Arc::new(e),
                })
        };

        let task = tokio::spawn(run);
        let abort = task.abort_handle();
        let cache = self.clone();
        tokio::spawn(async move {
            let resolution = match task.await {
                Ok(outcome) => Resolution::Done(outcome),
                Err(e) if e.is_cancelled() => Resolution::Superseded,
                // A panicking fetcher surfaces as an abort rather than a line
                // stuck in `Loading`.
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Query fetch task failed");
                    Resolution::Done(Err(QueryError::Aborted { key: key.clone() }))
                }
            };
            // Settle only after the predecessor has, so whoever waits on this
            // slot knows neither fetch is still running.
            if let Some(previous) = previous {
                wait_settled(previous).await;
            }
            cache.complete(&key, id, options, &resolution).await;
            let _ = sender.send(Some(resolution));
        });

        (slot, abort)
    }

    /// Record a fetch's outcome if the line still belongs to that fetch.
    async fn complete(&self, key: &QueryKey, id: u64, options: QueryOptions, resolution: &Resolution) {
        let mut state = self.state.lock().await;
        if state.retiring.get(key).is_some_and(|retired| retired.id == id) {
            state.retiring.remove(key);
        }
        let Resolution::Done(outcome) = resolution else {
            tracing::debug!(key = %key, fetch_id = id, "Query fetch aborted");
            return;
        };
        let Some(entry) = state.entries.get_mut(key) else {
            tracing::debug!(key = %key, fetch_id = id, "Discarding result for removed query");
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            tracing::debug!(key = %key, fetch_id = id, "Discarding result of superseded fetch");
            return;
        }

        let now = Instant::now();
        entry.in_flight = None;
        entry.fetched_at = Some(now);
        entry.updated_at = Some(Utc::now());
        entry.invalidated = false;

        match outcome {
            Ok(value) => {
                entry.status = QueryStatus::Success;
                entry.value = Some(Arc::clone(value));
                entry.error = None;
                entry.stale_after = Some(now + options.stale_time);
                self.events
                    .publish(QueryEvent::new(key.clone(), QueryEventKind::Success));
                tracing::debug!(key = %key, fetch_id = id, "Query fetch succeeded");
            }
            Err(e) => {
                entry.status = QueryStatus::Error;
                entry.value = None;
                entry.error = Some(e.clone());
                entry.stale_after = Some(now);
                self.events.publish(QueryEvent::new(
                    key.clone(),
                    QueryEventKind::Error {
                        message: e.to_string(),
                    },
                ));
                tracing::warn!(key = %key, fetch_id = id, error = %e, "Query fetch failed");
            }
        }
    }

    /// Wait on `slot`, following the replacement fetch when it is superseded.
    async fn wait_for_result(&self, key: &QueryKey, mut slot: Slot) -> FetchResult {
        loop {
            let resolution = match slot.wait_for(Option::is_some).await {
                Ok(resolved) => (*resolved).clone(),
                // The fetch task went away without resolving (runtime shutdown).
                Err(_) => None,
            };
            match resolution {
                Some(Resolution::Done(result)) => return result,
                Some(Resolution::Superseded) => {
                    let state = self.state.lock().await;
                    let Some(entry) = state.entries.get(key) else {
                        return Err(QueryError::Aborted { key: key.clone() });
                    };
                    if let Some(next) = &entry.in_flight {
                        tracing::debug!(key = %key, fetch_id = next.id, "Following replacement fetch");
                        slot = next.slot.clone();
                    } else if let (QueryStatus::Success, false, Some(value)) =
                        (entry.status, entry.invalidated, &entry.value)
                    {
                        return Ok(Arc::clone(value));
                    } else {
                        return Err(QueryError::Aborted { key: key.clone() });
                    }
                }
                None => return Err(QueryError::Aborted { key: key.clone() }),
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

async fn wait_settled(mut slot: Slot) {
    let _ = slot.wait_for(Option::is_some).await;
}

fn downcast<T>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, QueryError>
where
    T: Send + Sync + 'static,
{
    value.downcast::<T>().map_err(|_| QueryError::TypeMismatch {
        key: key.clone(),
        expected: type_name::<T>(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
