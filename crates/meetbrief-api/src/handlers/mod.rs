//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path, query and body parameters via axum
//! extractors, works against the repositories in AppState, and returns JSON.

mod action_items;
mod auth;
mod health;
mod integrations;
mod meetings;

pub use action_items::{
    create_action_item, delete_action_item, execute_action_item, list_action_items,
    process_summary, update_action_item, ActionItemListParams, ExecuteResponse,
    ProcessSummaryRequest,
};
pub use auth::{
    google_login, login, me, signup, token_form, Credentials, GoogleLoginRequest, PasswordForm,
    TokenResponse, UserResponse,
};
pub use health::{healthz, HealthResponse};
pub use integrations::{get_integrations, update_integrations, IntegrationsResponse};
pub use meetings::{
    list_meetings, sync_meetings, update_meeting_status, MeetingListParams, SyncParams,
    SyncResponse,
};
