//! Google OAuth and Calendar client.
//!
//! Endpoints come from [`GoogleConfig`] so tests can point the client at a
//! local mock server.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use meetbrief_core::config::GoogleConfig;
use meetbrief_core::types::{GoogleTokens, NewMeeting};

use crate::error::CalendarError;
use crate::events::{normalize_event, EventListResponse, GoogleEvent};
use crate::retry::{send_with_retry, RetryPolicy};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    aud: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Result of exchanging an authorization code.
#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub tokens: GoogleTokens,
    pub id_token: Option<String>,
}

pub struct GoogleClient {
    http: reqwest::Client,
    config: GoogleConfig,
    retry: RetryPolicy,
    refresh_lock: Mutex<()>,
}

impl GoogleClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: build_http_client(&config),
            config,
            retry: RetryPolicy::default(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn client_secret(&self) -> Result<&str, CalendarError> {
        if !self.is_configured() {
            return Err(CalendarError::NotConfigured);
        }
        self.config
            .client_secret
            .as_deref()
            .ok_or(CalendarError::NotConfigured)
    }

    /// Exchange a one-time authorization code for tokens.
    ///
    /// Sent once: a code that reached Google cannot be redeemed again.
    pub async fn exchange_code(&self, code: &str) -> Result<CodeExchange, CalendarError> {
        let secret = self.client_secret()?;
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", secret),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self
            .http
            .post(&self.config.token_uri)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(CalendarError::ExchangeFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        debug!(has_refresh = token.refresh_token.is_some(), "Authorization code exchanged");
        Ok(CodeExchange {
            tokens: GoogleTokens {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                expires_at: expiry_from(token.expires_in),
            },
            id_token: token.id_token,
        })
    }

    /// Validate an ID token with Google and return the account email.
    ///
    /// The token must have been issued to this client.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<String, CalendarError> {
        let resp = send_with_retry(
            self.http
                .get(&self.config.tokeninfo_uri)
                .query(&[("id_token", id_token)]),
            &self.retry,
        )
        .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(CalendarError::InvalidIdToken(format!(
                "tokeninfo returned HTTP {}",
                status
            )));
        }

        let info: TokenInfo = resp.json().await?;
        if info.aud.as_deref() != Some(self.config.client_id.as_str()) {
            return Err(CalendarError::InvalidIdToken(
                "audience does not match client id".to_string(),
            ));
        }
        info.email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| CalendarError::InvalidIdToken("no email claim".to_string()))
    }

    /// Obtain a fresh access token. Concurrent refreshes are serialized.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<GoogleTokens, CalendarError> {
        let _guard = self.refresh_lock.lock().await;
        let secret = self.client_secret()?;

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let resp = send_with_retry(
            self.http.post(&self.config.token_uri).form(&form),
            &self.retry,
        )
        .await?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_refresh_error(status.as_u16(), &body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CalendarError::RefreshFailed(format!("Malformed response: {}", e)))?;
        info!("Google access token refreshed");
        Ok(GoogleTokens {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expiry_from(token.expires_in),
        })
    }

    /// List primary-calendar events in a window, following pagination.
    pub async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<GoogleEvent>, CalendarError> {
        let url = format!(
            "{}/calendars/primary/events",
            self.config.calendar_api_base.trim_end_matches('/')
        );
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = time_max.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(access_token).query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let resp = send_with_retry(request, &self.retry).await?;
            let status = resp.status();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(CalendarError::AuthExpired);
            }
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(CalendarError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: EventListResponse = resp.json().await?;
            events.extend(page.items);

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!(count = events.len(), "Calendar events fetched");
        Ok(events)
    }

    /// Fetch the configured sync window around `now` as meeting drafts.
    pub async fn fetch_meetings(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<NewMeeting>, CalendarError> {
        let (time_min, time_max) = sync_window(
            now,
            self.config.sync_lookback_days,
            self.config.sync_lookahead_days,
        )?;
        let events = self.list_events(access_token, time_min, time_max).await?;
        let total = events.len();
        let meetings: Vec<NewMeeting> = events
            .into_iter()
            .filter_map(|event| normalize_event(event, now))
            .collect();
        if meetings.len() < total {
            debug!(skipped = total - meetings.len(), "Cancelled events skipped");
        }
        Ok(meetings)
    }
}

fn build_http_client(config: &GoogleConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "HTTP client setup failed, using defaults");
            reqwest::Client::new()
        })
}

/// `[now - lookback, now + lookahead]` in whole days.
fn sync_window(
    now: DateTime<Utc>,
    lookback_days: i64,
    lookahead_days: i64,
) -> Result<(DateTime<Utc>, DateTime<Utc>), CalendarError> {
    let start = TimeDelta::try_days(lookback_days)
        .and_then(|back| now.checked_sub_signed(back))
        .ok_or_else(|| {
            CalendarError::InvalidWindow(format!("lookback of {} days", lookback_days))
        })?;
    let end = TimeDelta::try_days(lookahead_days)
        .and_then(|ahead| now.checked_add_signed(ahead))
        .ok_or_else(|| {
            CalendarError::InvalidWindow(format!("lookahead of {} days", lookahead_days))
        })?;
    Ok((start, end))
}

fn expiry_from(expires_in: Option<i64>) -> Option<i64> {
    expires_in.map(|secs| Utc::now().timestamp() + secs)
}

fn map_refresh_error(status: u16, body: &str) -> CalendarError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        warn!(status, "Google refresh token rejected");
        return CalendarError::AuthExpired;
    }
    CalendarError::RefreshFailed(format!("HTTP {}: {}", status, body))
}
