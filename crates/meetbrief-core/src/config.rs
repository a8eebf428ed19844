use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MeetbriefError, Result};

/// Top-level configuration for the Meetbrief backend.
///
/// Loaded from `~/.meetbrief/config.toml` by default. Every section is
/// optional in the file and falls back to its `Default`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetbriefConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

impl MeetbriefConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MeetbriefConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MeetbriefError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay secrets and deployment settings from the environment.
    ///
    /// Recognised variables: `MEETBRIEF_APP_ENV`, `MEETBRIEF_JWT_SECRET`,
    /// `MEETBRIEF_GOOGLE_CLIENT_ID`, `MEETBRIEF_GOOGLE_CLIENT_SECRET` and
    /// `MEETBRIEF_CORS_ORIGINS` (comma separated). Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(env) = get("MEETBRIEF_APP_ENV") {
            self.general.app_env = env;
        }
        if let Some(secret) = get("MEETBRIEF_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(id) = get("MEETBRIEF_GOOGLE_CLIENT_ID") {
            self.google.client_id = id;
        }
        if let Some(secret) = get("MEETBRIEF_GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = Some(secret);
        }
        if let Some(origins) = get("MEETBRIEF_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Deployment environment name, e.g. "development" or "production".
    pub app_env: String,
    /// Data directory for the SQLite database and generated secrets.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            data_dir: "~/.meetbrief/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Token issuance and password policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens. Empty means a random secret is
    /// generated and persisted in the data directory on first start.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expires_in_secs: u64,
    pub jwt_issuer: String,
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expires_in_secs: 86_400,
            jwt_issuer: "meetbrief".to_string(),
            min_password_len: 6,
        }
    }
}

/// Google OAuth and Calendar API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub token_uri: String,
    pub tokeninfo_uri: String,
    pub calendar_api_base: String,
    /// Redirect URI sent with the code exchange. "postmessage" for popup flows.
    pub redirect_uri: String,
    pub sync_lookback_days: i64,
    pub sync_lookahead_days: i64,
    /// Whole-request timeout for Google calls.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            tokeninfo_uri: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            calendar_api_base: "https://www.googleapis.com/calendar/v3".to_string(),
            redirect_uri: "postmessage".to_string(),
            sync_lookback_days: 1,
            sync_lookahead_days: 2,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl GoogleConfig {
    /// Google sign-in needs both halves of the client credentials.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty()
            && self
                .client_secret
                .as_deref()
                .is_some_and(|s| !s.is_empty())
    }
}
