//! Shared domain types for meetings, action items and user accounts.
//!
//! Identifiers are opaque strings. Records serialize their identifier as
//! `_id` so clients see the same shape regardless of the storage backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enums
// =============================================================================

/// Kind of follow-up an action item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Email,
    Invite,
    Task,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Email => write!(f, "Email"),
            ActionType::Invite => write!(f, "Invite"),
            ActionType::Task => write!(f, "Task"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Email" => Ok(ActionType::Email),
            "Invite" => Ok(ActionType::Invite),
            "Task" => Ok(ActionType::Task),
            _ => Err(format!("Unknown action type: {}", s)),
        }
    }
}

/// Action item lifecycle states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    #[default]
    Pending,
    Executed,
    Completed,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "Pending"),
            ActionStatus::Executed => write!(f, "Executed"),
            ActionStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ActionStatus::Pending),
            "Executed" => Ok(ActionStatus::Executed),
            "Completed" => Ok(ActionStatus::Completed),
            _ => Err(format!("Unknown action status: {}", s)),
        }
    }
}

// =============================================================================
// Action items
// =============================================================================

/// A persisted action item owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub description: String,
    pub action_type: ActionType,
    pub status: ActionStatus,
    /// The person the item is assigned to, if known.
    pub owner: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub meeting_id: Option<String>,
    pub user_id: String,
}

/// Fields for creating an action item. Ownership is attached by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActionItem {
    pub description: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub status: ActionStatus,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meeting_id: Option<String>,
}

/// Partial update for an action item. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionItemUpdate {
    pub description: Option<String>,
    pub action_type: Option<ActionType>,
    pub status: Option<ActionStatus>,
    pub owner: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl ActionItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.action_type.is_none()
            && self.status.is_none()
            && self.owner.is_none()
            && self.due_date.is_none()
    }

    /// Apply the present fields onto an existing item.
    pub fn apply_to(&self, item: &mut ActionItem) {
        if let Some(ref description) = self.description {
            item.description = description.clone();
        }
        if let Some(action_type) = self.action_type {
            item.action_type = action_type;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(ref owner) = self.owner {
            item.owner = Some(owner.clone());
        }
        if let Some(due_date) = self.due_date {
            item.due_date = Some(due_date);
        }
    }
}

// =============================================================================
// Meetings
// =============================================================================

pub const MEETING_STATUS_PENDING: &str = "pending";

/// A calendar meeting synced for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(rename = "_id")]
    pub id: String,
    pub google_event_id: Option<String>,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_online: bool,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub summary_link: Option<String>,
    pub is_recorded: bool,
    /// Free-form processing state: pending, processed, unrecorded,
    /// offline-pending-input, completed.
    pub status: String,
    pub user_id: String,
}

/// A meeting before it is stored, as produced by a calendar source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub google_event_id: Option<String>,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub summary_link: Option<String>,
    #[serde(default)]
    pub is_recorded: bool,
    #[serde(default = "default_meeting_status")]
    pub status: String,
}

fn default_meeting_status() -> String {
    MEETING_STATUS_PENDING.to_string()
}

/// Partial update of a meeting's processing state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingUpdate {
    pub status: Option<String>,
    pub summary_link: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// A user account. Credentials and OAuth tokens never serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub is_active: bool,
    pub integrations: UserIntegrations,
}

/// Third-party connections for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserIntegrations {
    pub google_calendar: bool,
    pub notion: bool,
    #[serde(skip_serializing, default)]
    pub google_refresh_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub google_access_token: Option<String>,
    /// Unix seconds at which the stored access token expires.
    #[serde(default)]
    pub google_token_expiry: Option<i64>,
}

impl UserIntegrations {
    /// Whether the stored access token is missing or past its expiry.
    pub fn access_token_expired(&self, now: DateTime<Utc>) -> bool {
        match (&self.google_access_token, self.google_token_expiry) {
            (None, _) => true,
            (Some(_), Some(expiry)) => now.timestamp() >= expiry,
            (Some(_), None) => false,
        }
    }
}

/// Partial update of the boolean integration flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationFlags {
    pub google_calendar: Option<bool>,
    pub notion: Option<bool>,
}

impl IntegrationFlags {
    pub fn is_empty(&self) -> bool {
        self.google_calendar.is_none() && self.notion.is_none()
    }
}

/// OAuth tokens obtained from Google.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleTokens {
    pub access_token: String,
    /// Only present on first consent or when Google rotates it.
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_item() -> ActionItem {
        ActionItem {
            id: "a1".to_string(),
            description: "Update the deck".to_string(),
            action_type: ActionType::Task,
            status: ActionStatus::Pending,
            owner: None,
            due_date: None,
            meeting_id: Some("m1".to_string()),
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn test_action_type_display_and_parse() {
        for t in [ActionType::Email, ActionType::Invite, ActionType::Task] {
            let parsed: ActionType = t.to_string().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("email".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_action_status_default_is_pending() {
        assert_eq!(ActionStatus::default(), ActionStatus::Pending);
        assert_eq!(
            "Executed".parse::<ActionStatus>().unwrap(),
            ActionStatus::Executed
        );
        assert!("Done".parse::<ActionStatus>().is_err());
    }

    #[test]
    fn test_action_item_serializes_with_underscore_id() {
        let json = serde_json::to_value(sample_item()).unwrap();
        assert_eq!(json["_id"], "a1");
        assert_eq!(json["action_type"], "Task");
        assert_eq!(json["status"], "Pending");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_new_action_item_defaults() {
        let item: NewActionItem =
            serde_json::from_str(r#"{"description":"Call Ana","action_type":"Email"}"#).unwrap();
        assert_eq!(item.status, ActionStatus::Pending);
        assert!(item.owner.is_none());
        assert!(item.meeting_id.is_none());
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut item = sample_item();
        let update = ActionItemUpdate {
            status: Some(ActionStatus::Completed),
            owner: Some("Dana".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut item);
        assert_eq!(item.status, ActionStatus::Completed);
        assert_eq!(item.owner.as_deref(), Some("Dana"));
        assert_eq!(item.description, "Update the deck");
        assert_eq!(item.action_type, ActionType::Task);
    }

    #[test]
    fn test_update_ignores_nulls() {
        let update: ActionItemUpdate =
            serde_json::from_str(r#"{"description":null,"status":"Executed"}"#).unwrap();
        assert!(update.description.is_none());
        assert_eq!(update.status, Some(ActionStatus::Executed));
        assert!(ActionItemUpdate::default().is_empty());
    }

    #[test]
    fn test_new_meeting_default_status() {
        let json = r#"{
            "google_event_id": null,
            "title": "Sync",
            "start_time": "2024-05-01T09:00:00Z",
            "end_time": "2024-05-01T09:30:00Z"
        }"#;
        let meeting: NewMeeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.status, "pending");
        assert!(meeting.participants.is_empty());
        assert!(!meeting.is_online);
    }

    #[test]
    fn test_user_never_serializes_secrets() {
        let user = User {
            id: "u1".to_string(),
            email: "a@b.test".to_string(),
            hashed_password: "$argon2id$...".to_string(),
            is_active: true,
            integrations: UserIntegrations {
                google_calendar: true,
                notion: false,
                google_refresh_token: Some("refresh".to_string()),
                google_access_token: Some("access".to_string()),
                google_token_expiry: Some(1_700_000_000),
            },
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("refresh"));
        assert!(!json.contains("\"access\""));
        assert!(json.contains("google_token_expiry"));
    }

    #[test]
    fn test_access_token_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut integrations = UserIntegrations::default();
        assert!(integrations.access_token_expired(now));

        integrations.google_access_token = Some("tok".to_string());
        assert!(!integrations.access_token_expired(now));

        integrations.google_token_expiry = Some(now.timestamp() - 1);
        assert!(integrations.access_token_expired(now));

        integrations.google_token_expiry = Some(now.timestamp() + 600);
        assert!(!integrations.access_token_expired(now));
    }
}
