use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use meetbrief_calendar::{mock_meetings, CalendarError};
use meetbrief_core::types::{Meeting, MeetingUpdate, User};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MeetingListParams {
    /// `YYYY-MM-DD`, matched against the UTC start date.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    pub source: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
    pub synced_count: usize,
    pub status: String,
}

impl SyncResponse {
    fn new(message: &str, synced_count: usize, status: &str) -> Self {
        Self {
            message: message.to_string(),
            synced_count,
            status: status.to_string(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /meetings?date=YYYY-MM-DD
pub async fn list_meetings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<MeetingListParams>,
) -> Result<Json<Vec<Meeting>>, ApiError> {
    let on_date = match params.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::BadRequest("Invalid date format, expected YYYY-MM-DD".to_string())
        })?),
    };
    let meetings = state.meetings.list_for_user(&user.id, on_date)?;
    Ok(Json(meetings))
}

/// POST /meetings/sync?source=mock|google
///
/// Replaces the user's meetings with a fresh set from the source. The old set
/// is only dropped once the new one has been fetched.
pub async fn sync_meetings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncResponse>, ApiError> {
    match params.source.as_deref().unwrap_or("mock") {
        "mock" => {
            let drafts = mock_meetings(chrono::Local::now());
            let count = state.meetings.replace_for_user(&user.id, &drafts)?;
            info!(user_id = %user.id, count, source = "mock", "Meetings synced");
            Ok(Json(SyncResponse::new("Mock data loaded", count, "success")))
        }
        "google" => sync_google(&state, &user).await.map(Json),
        _ => Err(ApiError::BadRequest("Invalid sync source".to_string())),
    }
}

async fn sync_google(state: &AppState, user: &User) -> Result<SyncResponse, ApiError> {
    let integrations = &user.integrations;
    let refresh_token = match integrations.google_refresh_token.as_deref() {
        Some(token) if integrations.google_calendar => token,
        _ => {
            return Ok(SyncResponse::new(
                "Google Calendar is not connected. Please connect in settings.",
                0,
                "skipped",
            ));
        }
    };
    if !state.google.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Google sign-in is not configured".to_string(),
        ));
    }

    let now = Utc::now();
    let stored = integrations
        .google_access_token
        .as_deref()
        .filter(|_| !integrations.access_token_expired(now));
    let (mut access_token, mut refreshed) = match stored {
        Some(token) => (token.to_string(), false),
        None => match refresh_google_token(state, &user.id, refresh_token).await? {
            Some(token) => (token, true),
            None => return Ok(refresh_failed()),
        },
    };

    let drafts = loop {
        match state.google.fetch_meetings(&access_token, now).await {
            Ok(drafts) => break drafts,
            Err(CalendarError::AuthExpired) if !refreshed => {
                match refresh_google_token(state, &user.id, refresh_token).await? {
                    Some(token) => {
                        access_token = token;
                        refreshed = true;
                    }
                    None => return Ok(refresh_failed()),
                }
            }
            Err(e @ CalendarError::InvalidWindow(_)) => {
                return Err(ApiError::Internal(e.to_string()));
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Google Calendar fetch failed");
                return Err(ApiError::BadGateway(format!("Google Sync failed: {}", e)));
            }
        }
    };

    let count = state.meetings.replace_for_user(&user.id, &drafts)?;
    info!(user_id = %user.id, count, source = "google", "Meetings synced");
    Ok(SyncResponse::new(
        "Google Calendar sync completed",
        count,
        "success",
    ))
}

fn refresh_failed() -> SyncResponse {
    SyncResponse::new(
        "Failed to refresh Google token. Please reconnect.",
        0,
        "error",
    )
}

/// Refresh and persist the access token. `Ok(None)` means Google refused.
async fn refresh_google_token(
    state: &AppState,
    user_id: &str,
    refresh_token: &str,
) -> Result<Option<String>, ApiError> {
    let tokens = match state.google.refresh_access_token(refresh_token).await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(%user_id, error = %e, "Google token refresh failed");
            return Ok(None);
        }
    };
    if tokens.refresh_token.is_some() {
        state.users.store_google_tokens(user_id, &tokens)?;
    } else {
        state
            .users
            .set_access_token(user_id, &tokens.access_token, tokens.expires_at)?;
    }
    Ok(Some(tokens.access_token))
}

/// PATCH /meetings/{id}/status
pub async fn update_meeting_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(update): Json<MeetingUpdate>,
) -> Result<Json<Meeting>, ApiError> {
    state
        .meetings
        .update_status(&id, &user.id, &update)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))
}
