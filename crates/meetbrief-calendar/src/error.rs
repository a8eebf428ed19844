//! Error types for calendar sources.

use meetbrief_core::error::MeetbriefError;

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("Invalid Google token: {0}")]
    InvalidIdToken(String),
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Google sign-in is not configured")]
    NotConfigured,
    #[error("Invalid sync window: {0}")]
    InvalidWindow(String),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CalendarError> for MeetbriefError {
    fn from(err: CalendarError) -> Self {
        MeetbriefError::Calendar(err.to_string())
    }
}
