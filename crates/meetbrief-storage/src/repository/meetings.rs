use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use meetbrief_core::error::MeetbriefError;
use meetbrief_core::types::{Meeting, MeetingUpdate, NewMeeting};

use super::{conversion_err, from_ts, new_id, storage_err};
use crate::db::Database;

const MEETING_COLUMNS: &str = "id, google_event_id, title, start_time, end_time, is_online,
     location, participants, summary_link, is_recorded, status, user_id";

/// Repository for synced calendar meetings.
pub struct MeetingRepository {
    db: Arc<Database>,
}

impl MeetingRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a batch of meetings in one transaction. Returns the count.
    pub fn insert_many(
        &self,
        user_id: &str,
        drafts: &[NewMeeting],
    ) -> Result<usize, MeetbriefError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            let inserted = insert_rows(&tx, user_id, drafts)?;
            tx.commit().map_err(storage_err)?;
            Ok(inserted)
        })
    }

    /// Swap the user's meetings for a new set atomically.
    pub fn replace_for_user(
        &self,
        user_id: &str,
        drafts: &[NewMeeting],
    ) -> Result<usize, MeetbriefError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            let removed = tx
                .execute(
                    "DELETE FROM meetings WHERE user_id = ?1",
                    rusqlite::params![user_id],
                )
                .map_err(storage_err)?;
            let inserted = insert_rows(&tx, user_id, drafts)?;
            tx.commit().map_err(storage_err)?;
            debug!(user_id, removed, inserted, "Meetings replaced");
            Ok(inserted)
        })
    }

    /// List the user's meetings by start time, optionally only those
    /// starting on the given UTC date.
    pub fn list_for_user(
        &self,
        user_id: &str,
        on_date: Option<NaiveDate>,
    ) -> Result<Vec<Meeting>, MeetbriefError> {
        let (from, until) = match on_date {
            Some(date) => {
                let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
                let end = start
                    .checked_add_days(Days::new(1))
                    .unwrap_or(start);
                (start.timestamp(), end.timestamp())
            }
            None => (i64::MIN, i64::MAX),
        };

        let sql = format!(
            "SELECT {} FROM meetings
             WHERE user_id = ?1 AND start_time >= ?2 AND start_time < ?3
             ORDER BY start_time ASC",
            MEETING_COLUMNS
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, from, until], row_to_meeting)
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Meeting>, MeetbriefError> {
        self.db.with_conn(|conn| find_row(conn, id, user_id))
    }

    /// Apply a status/summary-link update. `None` if not found or not owned.
    pub fn update_status(
        &self,
        id: &str,
        user_id: &str,
        update: &MeetingUpdate,
    ) -> Result<Option<Meeting>, MeetbriefError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE meetings SET
                        status = COALESCE(?3, status),
                        summary_link = COALESCE(?4, summary_link)
                     WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![id, user_id, update.status, update.summary_link],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Ok(None);
            }
            find_row(conn, id, user_id)
        })
    }
}

fn insert_rows(
    conn: &Connection,
    user_id: &str,
    drafts: &[NewMeeting],
) -> Result<usize, MeetbriefError> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO meetings (id, user_id, google_event_id, title, start_time, end_time,
                                   is_online, location, participants, summary_link,
                                   is_recorded, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .map_err(storage_err)?;

    for draft in drafts {
        let participants = serde_json::to_string(&draft.participants)?;
        stmt.execute(rusqlite::params![
            new_id(),
            user_id,
            draft.google_event_id,
            draft.title,
            draft.start_time.timestamp(),
            draft.end_time.timestamp(),
            draft.is_online,
            draft.location,
            participants,
            draft.summary_link,
            draft.is_recorded,
            draft.status,
        ])
        .map_err(storage_err)?;
    }
    Ok(drafts.len())
}

fn find_row(conn: &Connection, id: &str, user_id: &str) -> Result<Option<Meeting>, MeetbriefError> {
    let sql = format!(
        "SELECT {} FROM meetings WHERE id = ?1 AND user_id = ?2",
        MEETING_COLUMNS
    );
    conn.query_row(&sql, rusqlite::params![id, user_id], row_to_meeting)
        .optional()
        .map_err(storage_err)
}

fn row_to_meeting(row: &rusqlite::Row<'_>) -> rusqlite::Result<Meeting> {
    let participants_json: String = row.get(7)?;
    let participants: Vec<String> =
        serde_json::from_str(&participants_json).map_err(|e| conversion_err(7, e))?;

    Ok(Meeting {
        id: row.get(0)?,
        google_event_id: row.get(1)?,
        title: row.get(2)?,
        start_time: from_ts(row.get(3)?),
        end_time: from_ts(row.get(4)?),
        is_online: row.get(5)?,
        location: row.get(6)?,
        participants,
        summary_link: row.get(8)?,
        is_recorded: row.get(9)?,
        status: row.get(10)?,
        user_id: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{make_db, make_user};
    use chrono::{TimeZone, Utc};

    fn draft(title: &str, hour: u32) -> NewMeeting {
        NewMeeting {
            google_event_id: Some(format!("evt_{}", hour)),
            title: title.to_string(),
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 1, hour, 30, 0).unwrap(),
            is_online: true,
            location: Some("Zoom".to_string()),
            participants: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            summary_link: None,
            is_recorded: false,
            status: "pending".to_string(),
        }
    }

    #[test]
    fn test_insert_and_list_ordered() {
        let db = make_db();
        let user = make_user(&db, "m@example.com");
        let repo = MeetingRepository::new(db);

        let count = repo
            .insert_many(&user, &[draft("Late", 15), draft("Early", 9)])
            .unwrap();
        assert_eq!(count, 2);

        let meetings = repo.list_for_user(&user, None).unwrap();
        let titles: Vec<&str> = meetings.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Early", "Late"]);
        assert_eq!(meetings[0].participants.len(), 2);
        assert_eq!(meetings[0].user_id, user);
        assert!(meetings[0].is_online);
    }

    #[test]
    fn test_list_filters_by_date() {
        let db = make_db();
        let user = make_user(&db, "d@example.com");
        let repo = MeetingRepository::new(db);

        let mut next_day = draft("Tomorrow", 10);
        next_day.start_time = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        next_day.end_time = Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap();
        repo.insert_many(&user, &[draft("Today", 10), next_day])
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let meetings = repo.list_for_user(&user, Some(day)).unwrap();
        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].title, "Tomorrow");
    }

    #[test]
    fn test_scoped_to_owner() {
        let db = make_db();
        let alice = make_user(&db, "alice@example.com");
        let bob = make_user(&db, "bob@example.com");
        let repo = MeetingRepository::new(db);

        repo.insert_many(&alice, &[draft("Alice only", 9)]).unwrap();
        let id = repo.list_for_user(&alice, None).unwrap()[0].id.clone();

        assert!(repo.list_for_user(&bob, None).unwrap().is_empty());
        assert!(repo.find_for_user(&id, &bob).unwrap().is_none());
        assert!(repo.find_for_user(&id, &alice).unwrap().is_some());
    }

    #[test]
    fn test_replace_for_user() {
        let db = make_db();
        let user = make_user(&db, "r@example.com");
        let other = make_user(&db, "o@example.com");
        let repo = MeetingRepository::new(db);

        repo.insert_many(&user, &[draft("Old", 9), draft("Old 2", 10)])
            .unwrap();
        repo.insert_many(&other, &[draft("Other", 9)]).unwrap();

        let inserted = repo.replace_for_user(&user, &[draft("New", 11)]).unwrap();
        assert_eq!(inserted, 1);

        let titles: Vec<String> = repo
            .list_for_user(&user, None)
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["New"]);
        assert_eq!(repo.list_for_user(&other, None).unwrap().len(), 1);
    }

    #[test]
    fn test_update_status() {
        let db = make_db();
        let user = make_user(&db, "s@example.com");
        let repo = MeetingRepository::new(db);
        repo.insert_many(&user, &[draft("Standup", 9)]).unwrap();
        let id = repo.list_for_user(&user, None).unwrap()[0].id.clone();

        let updated = repo
            .update_status(
                &id,
                &user,
                &MeetingUpdate {
                    status: Some("processed".to_string()),
                    summary_link: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, "processed");
        assert!(updated.summary_link.is_none());

        let linked = repo
            .update_status(
                &id,
                &user,
                &MeetingUpdate {
                    status: None,
                    summary_link: Some("https://docs.example.com/s".to_string()),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(linked.status, "processed");
        assert_eq!(
            linked.summary_link.as_deref(),
            Some("https://docs.example.com/s")
        );
    }

    #[test]
    fn test_update_status_not_owned() {
        let db = make_db();
        let user = make_user(&db, "own@example.com");
        let intruder = make_user(&db, "intruder@example.com");
        let repo = MeetingRepository::new(db);
        repo.insert_many(&user, &[draft("Private", 9)]).unwrap();
        let id = repo.list_for_user(&user, None).unwrap()[0].id.clone();

        let result = repo
            .update_status(&id, &intruder, &MeetingUpdate::default())
            .unwrap();
        assert!(result.is_none());
    }
}
