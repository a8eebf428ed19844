use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use meetbrief_core::types::{IntegrationFlags, UserIntegrations};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a user's integrations. Tokens stay server-side; only the
/// access-token expiry (unix seconds) is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsResponse {
    pub google_calendar: bool,
    pub notion: bool,
    pub google_token_expiry: Option<i64>,
}

impl From<&UserIntegrations> for IntegrationsResponse {
    fn from(integrations: &UserIntegrations) -> Self {
        Self {
            google_calendar: integrations.google_calendar,
            notion: integrations.notion,
            google_token_expiry: integrations.google_token_expiry,
        }
    }
}

/// Keep only known keys whose values are booleans.
fn flags_from_body(body: &Map<String, Value>) -> IntegrationFlags {
    IntegrationFlags {
        google_calendar: body.get("google_calendar").and_then(Value::as_bool),
        notion: body.get("notion").and_then(Value::as_bool),
    }
}

/// GET /user/integrations
pub async fn get_integrations(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<IntegrationsResponse> {
    Json(IntegrationsResponse::from(&user.integrations))
}

/// PATCH /user/integrations - set boolean flags; anything else is ignored.
pub async fn update_integrations(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<IntegrationsResponse>, ApiError> {
    let flags = flags_from_body(&body);
    if flags.is_empty() {
        return Ok(Json(IntegrationsResponse::from(&user.integrations)));
    }
    let updated = state
        .users
        .set_integration_flags(&user.id, flags)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    tracing::info!(user_id = %user.id, ?flags, "Integrations updated");
    Ok(Json(IntegrationsResponse::from(&updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_flags_from_body_filters() {
        let flags = flags_from_body(&object(json!({
            "google_calendar": true,
            "notion": "yes",
            "slack": true
        })));
        assert_eq!(flags.google_calendar, Some(true));
        assert_eq!(flags.notion, None);
    }

    #[test]
    fn test_response_shows_expiry_but_not_tokens() {
        let integrations = UserIntegrations {
            google_calendar: true,
            notion: false,
            google_refresh_token: Some("rt".to_string()),
            google_access_token: Some("at".to_string()),
            google_token_expiry: Some(1_700_000_000),
        };
        let json = serde_json::to_value(IntegrationsResponse::from(&integrations)).unwrap();
        assert_eq!(
            json,
            json!({"google_calendar": true, "notion": false, "google_token_expiry": 1_700_000_000})
        );
    }

    #[test]
    fn test_flags_from_empty_body() {
        assert!(flags_from_body(&Map::new()).is_empty());
    }
}
