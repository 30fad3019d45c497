/// Entity identifiers are opaque strings (the front end treats them as keys).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
