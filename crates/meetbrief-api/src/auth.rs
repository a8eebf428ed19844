//! Authentication: JWT issuance, password hashing, and the bearer middleware.
//!
//! Access tokens are HS256 JWTs whose subject is the account email. The
//! signing secret comes from config or is generated once and persisted next
//! to the database.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use meetbrief_core::error::MeetbriefError;
use meetbrief_core::types::User;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// JWT
// =============================================================================

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account email.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Creates and verifies access tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expires_in: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String, expires_in_secs: u64) -> Self {
        let expires_in = i64::try_from(expires_in_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(1));
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            expires_in,
        }
    }

    /// Issue a token for `email`, valid from now.
    pub fn create_token(&self, email: &str) -> Result<String, MeetbriefError> {
        self.create_token_at(email, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn create_token_at(
        &self,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, MeetbriefError> {
        let expires_at = issued_at
            .checked_add_signed(self.expires_in)
            .ok_or_else(|| MeetbriefError::Auth("Token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: email.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.issuer.clone(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| MeetbriefError::Auth(format!("Failed to sign token: {}", e)))
    }

    /// Check signature, issuer and expiry. Returns the claims on success.
    pub fn verify_token(&self, token: &str) -> Result<Claims, MeetbriefError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| MeetbriefError::Auth(e.to_string()))
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with Argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, MeetbriefError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MeetbriefError::Auth(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored hash.
///
/// Google-only accounts store an empty hash and never match.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    if hashed.is_empty() {
        return false;
    }
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

// =============================================================================
// Signing secret
// =============================================================================

/// Generate a random 64-character hex secret.
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Load the signing secret from file, or generate and save a new one.
pub fn load_or_generate_secret(secret_path: &std::path::Path) -> String {
    if let Ok(contents) = std::fs::read_to_string(secret_path) {
        let secret = contents.trim().to_string();
        if !secret.is_empty() {
            tracing::info!("JWT secret loaded from {}", secret_path.display());
            return secret;
        }
    }

    let secret = generate_secret();

    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(secret_path, &secret) {
        tracing::warn!(error = %e, "Failed to save JWT secret to {}", secret_path.display());
    } else {
        // Owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(secret_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("JWT secret saved to {}", secret_path.display());
    }

    secret
}

// =============================================================================
// Middleware
// =============================================================================

/// The authenticated account, inserted as a request extension by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

/// Middleware that resolves `Authorization: Bearer <jwt>` to an active user.
///
/// Returns 401 with `WWW-Authenticate: Bearer` when the header is missing,
/// the token fails verification, or the account is unknown or inactive.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let Some(token) = token else {
        return ApiError::Unauthorized("Not authenticated".to_string()).into_response();
    };

    let claims = match state.jwt.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()).into_response();
        }
    };

    let user = match state.users.find_by_email(&claims.sub) {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            return ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()).into_response();
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> JwtService {
        JwtService::new(secret, "meetbrief".to_string(), 86_400)
    }

    // =========================================================================
    // JWT
    // =========================================================================

    #[test]
    fn test_create_and_verify_token() {
        let jwt = service("test_secret_key");
        let token = jwt.create_token("sarah@example.com").unwrap();
        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "sarah@example.com");
        assert_eq!(claims.iss, "meetbrief");
        let ttl = claims.exp - Utc::now().timestamp();
        assert!(ttl > 23 * 3600 && ttl <= 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("secret1").create_token("a@example.com").unwrap();
        assert!(service("secret2").verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = JwtService::new("same", "someone-else".to_string(), 3600);
        let token = other.create_token("a@example.com").unwrap();
        assert!(service("same").verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtService::new("secret", "meetbrief".to_string(), 60);
        let token = jwt
            .create_token_at("a@example.com", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            jwt.verify_token(&token),
            Err(MeetbriefError::Auth(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service("secret").verify_token("not.a.jwt").is_err());
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_empty_or_malformed_hash_never_matches() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    // =========================================================================
    // Signing secret
    // =========================================================================

    #[test]
    fn test_generate_secret_shape() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_load_or_generate_secret_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jwt_secret");
        let first = load_or_generate_secret(&path);
        let second = load_or_generate_secret(&path);
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_blank_secret_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwt_secret");
        std::fs::write(&path, "  \n").unwrap();
        let secret = load_or_generate_secret(&path);
        assert_eq!(secret.len(), 64);
    }
}
