use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use meetbrief_core::types::{ActionItem, ActionItemUpdate, ActionStatus, NewActionItem};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

const ITEM_NOT_FOUND: &str = "Action item not found";

// =============================================================================
// Request / query types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProcessSummaryRequest {
    pub summary_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionItemListParams {
    /// Defaults to `Pending`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub status: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /action-items/meetings/{meeting_id}/process
///
/// Runs the extractor over a meeting summary and stores every candidate,
/// linked to the meeting, in the order found.
pub async fn process_summary(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(meeting_id): Path<String>,
    Json(body): Json<ProcessSummaryRequest>,
) -> Result<Json<Vec<ActionItem>>, ApiError> {
    let meeting = state
        .meetings
        .find_for_user(&meeting_id, &user.id)?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;

    let drafts: Vec<NewActionItem> = state
        .extractor
        .extract(&body.summary_text)
        .into_iter()
        .map(|candidate| candidate.into_new_item(Some(meeting.id.clone())))
        .collect();
    let items = state.action_items.insert_many(&user.id, &drafts)?;
    info!(user_id = %user.id, meeting_id = %meeting.id, count = items.len(), "Summary processed");
    Ok(Json(items))
}

/// GET /action-items?status=
pub async fn list_action_items(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ActionItemListParams>,
) -> Result<Json<Vec<ActionItem>>, ApiError> {
    let status = match params.status.as_deref() {
        None | Some("") => ActionStatus::Pending,
        Some(raw) => raw.parse::<ActionStatus>().map_err(ApiError::BadRequest)?,
    };
    Ok(Json(state.action_items.list_for_user(&user.id, status)?))
}

/// POST /action-items
pub async fn create_action_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(mut item): Json<NewActionItem>,
) -> Result<Json<ActionItem>, ApiError> {
    item.description = item.description.trim().to_string();
    if item.description.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Description must not be empty".to_string(),
        ));
    }
    if let Some(ref meeting_id) = item.meeting_id {
        if state.meetings.find_for_user(meeting_id, &user.id)?.is_none() {
            return Err(ApiError::NotFound("Meeting not found".to_string()));
        }
    }
    let created = state.action_items.insert(&user.id, &item)?;
    info!(user_id = %user.id, item_id = %created.id, "Action item created");
    Ok(Json(created))
}

/// PATCH /action-items/{id}
pub async fn update_action_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(update): Json<ActionItemUpdate>,
) -> Result<Json<ActionItem>, ApiError> {
    if update
        .description
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        return Err(ApiError::UnprocessableEntity(
            "Description must not be empty".to_string(),
        ));
    }
    state
        .action_items
        .update(&id, &user.id, &update)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))
}

/// DELETE /action-items/{id}
pub async fn delete_action_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.action_items.delete_for_user(&id, &user.id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()))
    }
}

/// POST /action-items/{id}/execute
///
/// Execution is simulated: the item is only marked `Executed`.
pub async fn execute_action_item(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    if !state
        .action_items
        .set_status(&id, &user.id, ActionStatus::Executed)?
    {
        return Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()));
    }
    info!(user_id = %user.id, item_id = %id, "Action item executed");
    Ok(Json(ExecuteResponse {
        status: "executed".to_string(),
    }))
}
