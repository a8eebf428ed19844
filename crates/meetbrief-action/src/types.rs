//! Extraction output types.

use meetbrief_core::types::{ActionStatus, ActionType, NewActionItem};
use serde::{Deserialize, Serialize};

/// An action item recognised in summary text, not yet persisted.
///
/// Each candidate comes from exactly one source line and always starts in
/// the `Pending` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItemCandidate {
    pub description: String,
    pub action_type: ActionType,
    pub status: ActionStatus,
}

impl ActionItemCandidate {
    pub fn new(description: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            description: description.into(),
            action_type,
            status: ActionStatus::Pending,
        }
    }

    /// Attach the originating meeting so the candidate can be stored.
    ///
    /// The owning user is supplied to the repository on insert.
    pub fn into_new_item(self, meeting_id: Option<String>) -> NewActionItem {
        NewActionItem {
            description: self.description,
            action_type: self.action_type,
            status: self.status,
            owner: None,
            due_date: None,
            meeting_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_candidate_is_pending() {
        let c = ActionItemCandidate::new("Send notes", ActionType::Email);
        assert_eq!(c.status, ActionStatus::Pending);
        assert_eq!(c.description, "Send notes");
    }

    #[test]
    fn test_into_new_item_keeps_fields() {
        let item = ActionItemCandidate::new("Book room", ActionType::Invite)
            .into_new_item(Some("m-42".to_string()));
        assert_eq!(item.description, "Book room");
        assert_eq!(item.action_type, ActionType::Invite);
        assert_eq!(item.status, ActionStatus::Pending);
        assert_eq!(item.meeting_id.as_deref(), Some("m-42"));
        assert!(item.owner.is_none());
        assert!(item.due_date.is_none());
    }

    #[test]
    fn test_candidate_serialization() {
        let c = ActionItemCandidate::new("Update the slide deck.", ActionType::Task);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["action_type"], "Task");
        assert_eq!(json["status"], "Pending");
    }
}
