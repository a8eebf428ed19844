//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use meetbrief_action::ActionExtractor;
use meetbrief_calendar::GoogleClient;
use meetbrief_core::config::MeetbriefConfig;
use meetbrief_storage::{ActionItemRepository, Database, MeetingRepository, UserRepository};

use crate::auth::JwtService;

/// Shared application state.
///
/// Every field is behind an `Arc`, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MeetbriefConfig>,
    pub database: Arc<Database>,
    pub users: Arc<UserRepository>,
    pub meetings: Arc<MeetingRepository>,
    pub action_items: Arc<ActionItemRepository>,
    pub extractor: Arc<ActionExtractor>,
    pub google: Arc<GoogleClient>,
    pub jwt: Arc<JwtService>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the repositories and services around one database.
    pub fn new(
        config: MeetbriefConfig,
        database: Database,
        google: GoogleClient,
        jwt_secret: &str,
    ) -> Self {
        let database = Arc::new(database);
        let jwt = JwtService::new(
            jwt_secret,
            config.auth.jwt_issuer.clone(),
            config.auth.jwt_expires_in_secs,
        );
        Self {
            users: Arc::new(UserRepository::new(database.clone())),
            meetings: Arc::new(MeetingRepository::new(database.clone())),
            action_items: Arc::new(ActionItemRepository::new(database.clone())),
            extractor: Arc::new(ActionExtractor::default()),
            google: Arc::new(google),
            jwt: Arc::new(jwt),
            config: Arc::new(config),
            database,
            start_time: Instant::now(),
        }
    }
}
