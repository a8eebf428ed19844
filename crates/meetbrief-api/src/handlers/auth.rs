use std::sync::LazyLock;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Form, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use meetbrief_calendar::CalendarError;
use meetbrief_core::types::User;

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::ApiError;
use crate::handlers::integrations::IntegrationsResponse;
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

const BAD_LOGIN: &str = "Incorrect email or password";
const BAD_GOOGLE_TOKEN: &str = "Invalid Google token";

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form body.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub code: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub integrations: IntegrationsResponse,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            integrations: IntegrationsResponse::from(&user.integrations),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /auth/signup - create a password account.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let email = body.email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::UnprocessableEntity(
            "Invalid email address".to_string(),
        ));
    }
    let min_len = state.config.auth.min_password_len;
    if body.password.chars().count() < min_len {
        return Err(ApiError::UnprocessableEntity(format!(
            "Password must be at least {} characters",
            min_len
        )));
    }

    let hashed = hash_password(&body.password)?;
    let user = state.users.create(email, &hashed)?;
    info!(user_id = %user.id, "User signed up");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login - exchange email and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    authenticate(&state, body.email.trim(), &body.password).map(Json)
}

/// POST /auth/token - same as login, for OAuth2 password-form clients.
pub async fn token_form(
    State(state): State<AppState>,
    Form(form): Form<PasswordForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    authenticate(&state, form.username.trim(), &form.password).map(Json)
}

fn authenticate(state: &AppState, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
    let user = state
        .users
        .find_by_email(email)?
        .filter(|user| verify_password(password, &user.hashed_password))
        .ok_or_else(|| ApiError::Unauthorized(BAD_LOGIN.to_string()))?;
    if !user.is_active {
        return Err(ApiError::Unauthorized(BAD_LOGIN.to_string()));
    }
    let token = state.jwt.create_token(&user.email)?;
    info!(user_id = %user.id, "User logged in");
    Ok(TokenResponse::bearer(token))
}

/// POST /auth/google - sign in with a Google authorization code.
///
/// Creates the account on first sign-in; otherwise refreshes the stored
/// Google tokens. Either way the calendar integration ends up connected.
pub async fn google_login(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !state.google.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "Google sign-in is not configured".to_string(),
        ));
    }

    let exchange = state
        .google
        .exchange_code(&body.code)
        .await
        .map_err(google_login_error)?;
    let id_token = exchange
        .id_token
        .ok_or_else(|| ApiError::Unauthorized(BAD_GOOGLE_TOKEN.to_string()))?;
    let email = state
        .google
        .verify_id_token(&id_token)
        .await
        .map_err(google_login_error)?;

    let user = match state.users.find_by_email(&email)? {
        Some(user) => {
            state.users.store_google_tokens(&user.id, &exchange.tokens)?;
            user
        }
        None => {
            let user = state.users.create_google_user(&email, &exchange.tokens)?;
            info!(user_id = %user.id, "User created from Google sign-in");
            user
        }
    };
    if !user.is_active {
        return Err(ApiError::Unauthorized(BAD_GOOGLE_TOKEN.to_string()));
    }

    let token = state.jwt.create_token(&user.email)?;
    info!(user_id = %user.id, "User logged in with Google");
    Ok(Json(TokenResponse::bearer(token)))
}

fn google_login_error(err: CalendarError) -> ApiError {
    match err {
        CalendarError::InvalidIdToken(reason) => {
            warn!(%reason, "Google ID token rejected");
            ApiError::Unauthorized(BAD_GOOGLE_TOKEN.to_string())
        }
        CalendarError::NotConfigured => {
            ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
        }
        other => ApiError::BadRequest(format!("Google login failed: {}", other)),
    }
}

/// GET /auth/me - the authenticated account.
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
