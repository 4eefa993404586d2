/// Project, competitor and snapshot primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Reports and report versions are keyed by UUIDs minted in memory, before
/// anything reaches the store.
pub type ReportId = uuid::Uuid;
