use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One persisted message row.
///
/// `id` and `timestamp` are assigned by the database on insert; rows are
/// never mutated afterwards and there is no deletion path.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MessageRecord {
    pub id: i32,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}
