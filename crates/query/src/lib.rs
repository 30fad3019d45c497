//! Keyed cache of asynchronous fetches.
//!
//! [`QueryCache`] deduplicates concurrent fetches per [`QueryKey`], serves
//! results inside a freshness window and reports a [`QueryStatus`] per key.
//! Status transitions are broadcast as [`QueryEvent`]s.

pub mod cache;
pub mod error;
pub mod events;
pub mod key;
pub mod status;

pub use cache::{QueryCache, QueryOptions, QuerySnapshot, DEFAULT_STALE_TIME};
pub use error::QueryError;
pub use events::{QueryEvent, QueryEventBus, QueryEventKind};
pub use key::QueryKey;
pub use status::QueryStatus;
