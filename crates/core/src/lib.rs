//! Shared building blocks for the job-search dashboard data layer.
//!
//! This crate has zero internal dependencies. It holds the common type
//! aliases, the [`CoreError`](error::CoreError) taxonomy used by the entity
//! store, and the pure [`view`] derivation engine that filters, sorts and
//! paginates any collection implementing [`view::TableRow`].

pub mod error;
pub mod types;
pub mod view;
