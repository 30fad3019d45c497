//! Dashboard data layer: the job API, cached dashboard queries and the
//! mutations that keep them consistent.

pub mod api;
pub mod config;
pub mod queries;
pub mod state;
