//! HTTP helpers shared by the provider clients

use std::time::Duration;

use log::{error, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};

use crate::errors::{AppError, AppResult};

/// Retry settings for provider requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt: base * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send a request, retrying rate limits, server errors and transport failures.
///
/// `build` is called once per attempt because a `RequestBuilder` is consumed
/// by `send`.
pub async fn send_with_retry<F>(provider: &str, policy: RetryPolicy, build: F) -> AppResult<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempts = 0;

    loop {
        attempts += 1;
        match build().send().await {
            Ok(resp) if resp.status().is_success() => return Ok(resp),
            Ok(resp) => {
                let status = resp.status();
                let error_text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "Failed to read error body".to_string());
                let message = extract_error_message(&error_text);
                error!("{} API error (status {}): {}", provider, status, message);

                if is_retryable(status) && attempts < policy.max_attempts {
                    let wait_time = policy.delay_for(attempts);
                    warn!("{}: retrying in {:?} (attempt {}/{})", provider, wait_time, attempts + 1, policy.max_attempts);
                    tokio::time::sleep(wait_time).await;
                    continue;
                }

                return Err(AppError::ApiError(format!(
                    "{} API error ({}): {}",
                    provider, status, message
                )));
            }
            Err(e) => {
                error!("{} HTTP error: {}", provider, e);
                if attempts < policy.max_attempts {
                    let wait_time = policy.delay_for(attempts);
                    warn!("{}: retrying in {:?} (attempt {}/{})", provider, wait_time, attempts + 1, policy.max_attempts);
                    tokio::time::sleep(wait_time).await;
                    continue;
                }
                return Err(AppError::ApiError(format!("{} request failed: {}", provider, e)));
            }
        }
    }
}

/// Pull a readable message out of a JSON error body, falling back to the raw text
pub fn extract_error_message(body: &str) -> String {
    let parsed: Value =
        serde_json::from_str(body).unwrap_or_else(|_| json!({"error": {"message": body}}));

    parsed["error"]["message"]
        .as_str()
        .or_else(|| parsed["message"].as_str())
        .or_else(|| parsed["detail"]["message"].as_str())
        .or_else(|| parsed["error"].as_str())
        .unwrap_or(body)
        .trim()
        .to_string()
}
