//! Database schema migrations.
//!
//! Applies the initial schema: users, meetings, action_items and the
//! schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use meetbrief_core::error::MeetbriefError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), MeetbriefError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| MeetbriefError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| MeetbriefError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
///
/// Timestamps are unix seconds. `participants` holds a JSON array of
/// email strings.
fn apply_v1(conn: &Connection) -> Result<(), MeetbriefError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                    TEXT PRIMARY KEY NOT NULL,
            email                 TEXT NOT NULL UNIQUE,
            hashed_password       TEXT NOT NULL DEFAULT '',
            is_active             INTEGER NOT NULL DEFAULT 1,
            google_calendar       INTEGER NOT NULL DEFAULT 0,
            notion                INTEGER NOT NULL DEFAULT 0,
            google_refresh_token  TEXT,
            google_access_token   TEXT,
            google_token_expiry   INTEGER,
            created_at            INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS meetings (
            id               TEXT PRIMARY KEY NOT NULL,
            user_id          TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            google_event_id  TEXT,
            title            TEXT NOT NULL,
            start_time       INTEGER NOT NULL,
            end_time         INTEGER NOT NULL,
            is_online        INTEGER NOT NULL DEFAULT 0,
            location         TEXT,
            participants     TEXT NOT NULL DEFAULT '[]',
            summary_link     TEXT,
            is_recorded      INTEGER NOT NULL DEFAULT 0,
            status           TEXT NOT NULL DEFAULT 'pending'
        );

        CREATE INDEX IF NOT EXISTS idx_meetings_user_start
            ON meetings (user_id, start_time);

        CREATE TABLE IF NOT EXISTS action_items (
            id           TEXT PRIMARY KEY NOT NULL,
            user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            meeting_id   TEXT,
            description  TEXT NOT NULL,
            action_type  TEXT NOT NULL
                         CHECK (action_type IN ('Email', 'Invite', 'Task')),
            status       TEXT NOT NULL DEFAULT 'Pending'
                         CHECK (status IN ('Pending', 'Executed', 'Completed')),
            owner        TEXT,
            due_date     INTEGER,
            created_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_action_items_user_status
            ON action_items (user_id, status);

        CREATE INDEX IF NOT EXISTS idx_action_items_meeting
            ON action_items (meeting_id);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| MeetbriefError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
