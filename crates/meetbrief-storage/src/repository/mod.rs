//! Repository implementations for SQLite-backed persistence.
//!
//! Every read and write on meetings and action items is scoped by the owning
//! user's id, so a record that exists but belongs to someone else behaves
//! exactly like a missing one.

mod action_items;
mod meetings;
mod users;

pub use action_items::ActionItemRepository;
pub use meetings::MeetingRepository;
pub use users::UserRepository;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use meetbrief_core::error::MeetbriefError;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn storage_err(e: rusqlite::Error) -> MeetbriefError {
    MeetbriefError::Storage(e.to_string())
}

/// Wrap a decode failure so it can surface from a row-mapping closure.
fn conversion_err(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod test_support {
    use std::sync::Arc;

    use crate::db::Database;

    use super::UserRepository;

    pub fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    /// Create a user and return its id.
    pub fn make_user(db: &Arc<Database>, email: &str) -> String {
        UserRepository::new(Arc::clone(db))
            .create(email, "hash")
            .unwrap()
            .id
    }
}
