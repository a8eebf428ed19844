//! Bounded retry for Google API requests.
//!
//! Retries 408, 429 and 5xx responses plus connect/timeout transport errors
//! with exponential backoff. `Retry-After` in seconds is honoured, capped at
//! 30 seconds.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::CalendarError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    if let Some(value) = retry_after.and_then(|v| v.to_str().ok()) {
        if let Ok(secs) = value.parse::<u64>() {
            return Duration::from_secs(secs.min(30));
        }
    }

    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    let jitter = if base == 0 {
        0
    } else {
        rand::rng().random_range(0..150)
    };
    Duration::from_millis(base.saturating_add(jitter))
}

/// Send a request, retrying transient failures per `policy`.
///
/// Requests whose body cannot be cloned are sent once.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, CalendarError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let Some(cloned) = request.try_clone() else {
            return request.send().await.map_err(CalendarError::Http);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if is_retryable(status) && attempt < attempts {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    warn!(attempt, attempts, %status, ?delay, "Google API retry after status");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Ok(response);
            }
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    warn!(attempt, attempts, error = %err, ?delay, "Google API retry after transport error");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(CalendarError::Http(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(reqwest::StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(reqwest::StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_retry_after_header_wins_and_is_capped() {
        let policy = RetryPolicy::default();
        let header = reqwest::header::HeaderValue::from_static("7");
        assert_eq!(
            retry_delay(1, &policy, Some(&header)),
            Duration::from_secs(7)
        );
        let huge = reqwest::header::HeaderValue::from_static("600");
        assert_eq!(
            retry_delay(1, &policy, Some(&huge)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let first = retry_delay(1, &policy, None);
        let third = retry_delay(3, &policy, None);
        let tenth = retry_delay(10, &policy, None);
        assert!(first >= Duration::from_millis(250) && first < Duration::from_millis(400));
        assert!(third >= Duration::from_millis(1_000));
        assert!(tenth < Duration::from_millis(2_150));
    }

    #[test]
    fn test_none_policy_has_no_delay() {
        assert_eq!(retry_delay(1, &RetryPolicy::none(), None), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_send_with_retry_exhausts_attempts() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        };
        let client = reqwest::Client::new();
        let response = send_with_retry(client.get(format!("{}/flaky", server.url())), &policy)
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_with_retry_passes_through_client_error() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("GET", "/denied")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let response = send_with_retry(
            client.get(format!("{}/denied", server.url())),
            &RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        denied.assert_async().await;
    }
}
