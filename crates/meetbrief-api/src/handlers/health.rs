use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /healthz - liveness plus a database round trip.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = if state.database.ping() {
        "connected"
    } else {
        "disconnected"
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        db: db.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
