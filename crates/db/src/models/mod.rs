//! Domain model structs and DTOs.
//!
//! Each entity submodule contains:
//! - A `Serialize` + `Deserialize` entity struct (camelCase on the wire)
//! - A `Deserialize` create DTO
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//! - The entity's [`TableRow`](jobdash_core::view::TableRow) comparator table

pub mod dashboard;
pub mod offer;
pub mod source;
