//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use meetbrief_core::config::MeetbriefConfig;
use meetbrief_core::error::MeetbriefError;

use crate::handlers;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    // Routes that do NOT require authentication.
    let public_routes = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/token", post(handlers::token_form))
        .route("/auth/google", post(handlers::google_login));

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::me))
        .route("/meetings", get(handlers::list_meetings))
        .route("/meetings/", get(handlers::list_meetings))
        .route("/meetings/sync", post(handlers::sync_meetings))
        .route(
            "/meetings/{id}/status",
            patch(handlers::update_meeting_status),
        )
        .route(
            "/action-items",
            get(handlers::list_action_items).post(handlers::create_action_item),
        )
        .route(
            "/action-items/",
            get(handlers::list_action_items).post(handlers::create_action_item),
        )
        .route(
            "/action-items/meetings/{meeting_id}/process",
            post(handlers::process_summary),
        )
        .route(
            "/action-items/{id}",
            patch(handlers::update_action_item).delete(handlers::delete_action_item),
        )
        .route(
            "/action-items/{id}/execute",
            post(handlers::execute_action_item),
        )
        .route(
            "/user/integrations",
            get(handlers::get_integrations).patch(handlers::update_integrations),
        )
        .route(
            "/user/integrations/",
            get(handlers::get_integrations).patch(handlers::update_integrations),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured host and port and serve until the process exits.
pub async fn start_server(config: &MeetbriefConfig, state: AppState) -> Result<(), MeetbriefError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MeetbriefError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| MeetbriefError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Must not panic on a header-invalid origin.
        let _ = cors_layer(&[
            "http://localhost:5173".to_string(),
            "bad\norigin".to_string(),
        ]);
    }
}
