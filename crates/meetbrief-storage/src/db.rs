//! The single SQLite connection shared by every repository.
//!
//! Users, meetings and action items live in one file. Writers are
//! serialized through a Mutex; WAL keeps readers from blocking on a sync.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use meetbrief_core::error::MeetbriefError;

use crate::migrations;

/// Shared handle to the Meetbrief database. `Connection` is not `Sync`,
/// hence the Mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database file, creating parent directories, then
    /// bring the schema up to date. Ownership cascades rely on
    /// `foreign_keys = ON`.
    pub fn new(path: &Path) -> Result<Self, MeetbriefError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| MeetbriefError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| MeetbriefError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!(path = %path.display(), "Database opened");
        Self::migrated(conn)
    }

    /// A throwaway migrated database, used by tests.
    pub fn in_memory() -> Result<Self, MeetbriefError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MeetbriefError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| MeetbriefError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, MeetbriefError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run `f` against the connection while holding the lock. Keep it short:
    /// every request waits on this mutex.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MeetbriefError>
    where
        F: FnOnce(&Connection) -> Result<T, MeetbriefError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| MeetbriefError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Round-trip a trivial query to check the connection is usable.
    pub fn ping(&self) -> bool {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|e| MeetbriefError::Storage(e.to_string()))
        })
        .is_ok()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_users(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                .map_err(|e| MeetbriefError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_users(&db), 0);
        assert!(db.ping());
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("meetbrief.db");
        let db = Database::new(&path).unwrap();
        assert_eq!(count_users(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_wal_mode_enabled_for_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("wal.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
                    .map_err(|e| MeetbriefError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        {
            let db = Database::new(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (id, email, hashed_password) VALUES ('u1', 'a@b.test', '')",
                    [],
                )
                .map_err(|e| MeetbriefError::Storage(e.to_string()))
            })
            .unwrap();
        }
        let db = Database::new(&path).unwrap();
        assert_eq!(count_users(&db), 1);
    }
}
