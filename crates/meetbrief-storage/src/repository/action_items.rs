use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};

use meetbrief_core::error::MeetbriefError;
use meetbrief_core::types::{ActionItem, ActionItemUpdate, ActionStatus, NewActionItem};

use super::{conversion_err, from_ts, new_id, storage_err};
use crate::db::Database;

const ITEM_COLUMNS: &str =
    "id, description, action_type, status, owner, due_date, meeting_id, user_id";

/// Maximum number of items returned by a list query.
pub const LIST_LIMIT: u32 = 100;

/// Repository for action items.
pub struct ActionItemRepository {
    db: Arc<Database>,
}

impl ActionItemRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, user_id: &str, item: &NewActionItem) -> Result<ActionItem, MeetbriefError> {
        self.db.with_conn(|conn| insert_row(conn, user_id, item))
    }

    /// Insert several items in one transaction, preserving input order.
    pub fn insert_many(
        &self,
        user_id: &str,
        items: &[NewActionItem],
    ) -> Result<Vec<ActionItem>, MeetbriefError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            let stored = items
                .iter()
                .map(|item| insert_row(&tx, user_id, item))
                .collect::<Result<Vec<_>, _>>()?;
            tx.commit().map_err(storage_err)?;
            Ok(stored)
        })
    }

    /// List the user's items with the given status in creation order.
    pub fn list_for_user(
        &self,
        user_id: &str,
        status: ActionStatus,
    ) -> Result<Vec<ActionItem>, MeetbriefError> {
        let sql = format!(
            "SELECT {} FROM action_items
             WHERE user_id = ?1 AND status = ?2
             ORDER BY rowid ASC
             LIMIT ?3",
            ITEM_COLUMNS
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![user_id, status.to_string(), LIST_LIMIT],
                    row_to_item,
                )
                .map_err(storage_err)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
        })
    }

    pub fn find_for_user(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<ActionItem>, MeetbriefError> {
        self.db.with_conn(|conn| find_row(conn, id, user_id))
    }

    /// Apply a partial update. `None` if not found or not owned.
    pub fn update(
        &self,
        id: &str,
        user_id: &str,
        update: &ActionItemUpdate,
    ) -> Result<Option<ActionItem>, MeetbriefError> {
        self.db.with_conn(|conn| {
            let Some(mut item) = find_row(conn, id, user_id)? else {
                return Ok(None);
            };
            if update.is_empty() {
                return Ok(Some(item));
            }
            update.apply_to(&mut item);
            item.due_date = item.due_date.map(|d| from_ts(d.timestamp()));
            conn.execute(
                "UPDATE action_items SET
                    description = ?3, action_type = ?4, status = ?5, owner = ?6, due_date = ?7
                 WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![
                    id,
                    user_id,
                    item.description,
                    item.action_type.to_string(),
                    item.status.to_string(),
                    item.owner,
                    item.due_date.map(|d| d.timestamp()),
                ],
            )
            .map_err(storage_err)?;
            Ok(Some(item))
        })
    }

    /// Set the status. Returns false if not found or not owned.
    pub fn set_status(
        &self,
        id: &str,
        user_id: &str,
        status: ActionStatus,
    ) -> Result<bool, MeetbriefError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE action_items SET status = ?3 WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![id, user_id, status.to_string()],
                )
                .map_err(storage_err)?;
            Ok(changed > 0)
        })
    }

    /// Delete an item. Returns false if not found or not owned.
    pub fn delete_for_user(&self, id: &str, user_id: &str) -> Result<bool, MeetbriefError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM action_items WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![id, user_id],
                )
                .map_err(storage_err)?;
            Ok(changed > 0)
        })
    }
}

fn insert_row(
    conn: &Connection,
    user_id: &str,
    item: &NewActionItem,
) -> Result<ActionItem, MeetbriefError> {
    let id = new_id();
    conn.execute(
        "INSERT INTO action_items (id, user_id, meeting_id, description, action_type,
                                   status, owner, due_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            id,
            user_id,
            item.meeting_id,
            item.description,
            item.action_type.to_string(),
            item.status.to_string(),
            item.owner,
            item.due_date.map(|d| d.timestamp()),
        ],
    )
    .map_err(|e| MeetbriefError::Storage(format!("Failed to save action item: {}", e)))?;

    Ok(ActionItem {
        id,
        description: item.description.clone(),
        action_type: item.action_type,
        status: item.status,
        owner: item.owner.clone(),
        due_date: item.due_date.map(|d| from_ts(d.timestamp())),
        meeting_id: item.meeting_id.clone(),
        user_id: user_id.to_string(),
    })
}

fn find_row(
    conn: &Connection,
    id: &str,
    user_id: &str,
) -> Result<Option<ActionItem>, MeetbriefError> {
    let sql = format!(
        "SELECT {} FROM action_items WHERE id = ?1 AND user_id = ?2",
        ITEM_COLUMNS
    );
    conn.query_row(&sql, rusqlite::params![id, user_id], row_to_item)
        .optional()
        .map_err(storage_err)
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActionItem> {
    let action_type: String = row.get(2)?;
    let status: String = row.get(3)?;
    let due_date: Option<i64> = row.get(5)?;

    Ok(ActionItem {
        id: row.get(0)?,
        description: row.get(1)?,
        action_type: action_type
            .parse()
            .map_err(|e: String| conversion_err(2, std::io::Error::other(e)))?,
        status: status
            .parse()
            .map_err(|e: String| conversion_err(3, std::io::Error::other(e)))?,
        owner: row.get(4)?,
        due_date: due_date.map(from_ts),
        meeting_id: row.get(6)?,
        user_id: row.get(7)?,
    })
}
