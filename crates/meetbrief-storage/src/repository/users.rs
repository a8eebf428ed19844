use std::sync::Arc;

use rusqlite::{ErrorCode, OptionalExtension};
use tracing::debug;

use meetbrief_core::error::MeetbriefError;
use meetbrief_core::types::{GoogleTokens, IntegrationFlags, User, UserIntegrations};

use super::{new_id, storage_err};
use crate::db::Database;

const USER_COLUMNS: &str = "id, email, hashed_password, is_active, google_calendar, notion,
     google_refresh_token, google_access_token, google_token_expiry";

/// Repository for user accounts and their integration state.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a password account. Fails with `Conflict` if the email exists.
    pub fn create(&self, email: &str, hashed_password: &str) -> Result<User, MeetbriefError> {
        let id = new_id();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, hashed_password) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, email, hashed_password],
            )
            .map_err(map_insert_err)?;
            Ok(())
        })?;
        debug!(user_id = %id, "User created");
        self.require(&id)
    }

    /// Create an account that signs in through Google only.
    ///
    /// The password hash is empty, so password login can never succeed.
    pub fn create_google_user(
        &self,
        email: &str,
        tokens: &GoogleTokens,
    ) -> Result<User, MeetbriefError> {
        let id = new_id();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, hashed_password, google_calendar,
                                    google_refresh_token, google_access_token, google_token_expiry)
                 VALUES (?1, ?2, '', 1, ?3, ?4, ?5)",
                rusqlite::params![
                    id,
                    email,
                    tokens.refresh_token,
                    tokens.access_token,
                    tokens.expires_at,
                ],
            )
            .map_err(map_insert_err)?;
            Ok(())
        })?;
        debug!(user_id = %id, "Google user created");
        self.require(&id)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, MeetbriefError> {
        self.find_where("email = ?1", email)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>, MeetbriefError> {
        self.find_where("id = ?1", id)
    }

    /// Record a fresh Google grant and mark the calendar as connected.
    ///
    /// An absent refresh token keeps the previously stored one.
    pub fn store_google_tokens(
        &self,
        id: &str,
        tokens: &GoogleTokens,
    ) -> Result<(), MeetbriefError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET
                    google_calendar = 1,
                    google_access_token = ?2,
                    google_token_expiry = ?3,
                    google_refresh_token = COALESCE(?4, google_refresh_token)
                 WHERE id = ?1",
                rusqlite::params![id, tokens.access_token, tokens.expires_at, tokens.refresh_token],
            )
            .map_err(storage_err)?;
            Ok(())
        })
    }

    /// Persist a refreshed access token.
    pub fn set_access_token(
        &self,
        id: &str,
        access_token: &str,
        expires_at: Option<i64>,
    ) -> Result<(), MeetbriefError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET google_access_token = ?2, google_token_expiry = ?3 WHERE id = ?1",
                rusqlite::params![id, access_token, expires_at],
            )
            .map_err(storage_err)?;
            Ok(())
        })
    }

    /// Apply the present flags and return the updated integrations.
    pub fn set_integration_flags(
        &self,
        id: &str,
        flags: IntegrationFlags,
    ) -> Result<Option<UserIntegrations>, MeetbriefError> {
        if !flags.is_empty() {
            self.db.with_conn(|conn| {
                conn.execute(
                    "UPDATE users SET
                        google_calendar = COALESCE(?2, google_calendar),
                        notion = COALESCE(?3, notion)
                     WHERE id = ?1",
                    rusqlite::params![id, flags.google_calendar, flags.notion],
                )
                .map_err(storage_err)?;
                Ok(())
            })?;
        }
        Ok(self.find_by_id(id)?.map(|u| u.integrations))
    }

    fn find_where(&self, predicate: &str, value: &str) -> Result<Option<User>, MeetbriefError> {
        let sql = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, predicate);
        self.db.with_conn(|conn| {
            conn.query_row(&sql, rusqlite::params![value], row_to_user)
                .optional()
                .map_err(storage_err)
        })
    }

    fn require(&self, id: &str) -> Result<User, MeetbriefError> {
        self.find_by_id(id)?
            .ok_or_else(|| MeetbriefError::Storage(format!("User {} vanished after insert", id)))
    }
}

fn map_insert_err(e: rusqlite::Error) -> MeetbriefError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            MeetbriefError::Conflict("Email already registered".to_string())
        }
        other => storage_err(other),
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        is_active: row.get(3)?,
        integrations: UserIntegrations {
            google_calendar: row.get(4)?,
            notion: row.get(5)?,
            google_refresh_token: row.get(6)?,
            google_access_token: row.get(7)?,
            google_token_expiry: row.get(8)?,
        },
    })
}
