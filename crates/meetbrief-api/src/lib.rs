//! Meetbrief API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API for Meetbrief: account signup and login (password
//! and Google), calendar sync, meeting listing, action item extraction from
//! meeting summaries, action item management, and integration settings.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
