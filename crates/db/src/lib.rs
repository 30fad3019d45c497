//! Entity store for the job-search dashboard.
//!
//! - [`models`]: `JobSource`, `JobOffer`, their create/update DTOs, and the
//!   derived dashboard aggregates.
//! - [`store::EntityStore`]: the authoritative in-memory collections with
//!   read accessors, the offer to source join, and synchronous mutations.
//! - [`seed`]: the mock data set the dashboard ships with.

pub mod models;
pub mod seed;
pub mod store;

pub use store::EntityStore;
