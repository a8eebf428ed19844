//! Calendar sources for Meetbrief.
//!
//! Google OAuth (code exchange, ID token verification, refresh), Calendar v3
//! event listing with normalization into [`NewMeeting`] drafts, and a mock
//! schedule generator for demos.
//!
//! [`NewMeeting`]: meetbrief_core::types::NewMeeting

pub mod error;
pub mod events;
pub mod google;
pub mod mock;
pub mod retry;

pub use error::CalendarError;
pub use events::{normalize_event, GoogleEvent};
pub use google::{CodeExchange, GoogleClient};
pub use mock::mock_meetings;
pub use retry::RetryPolicy;
