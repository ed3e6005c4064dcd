//! Retry policy for GitHub API calls.
//!
//! Network failures and 5xx responses are retried; 4xx responses fail at once with a
//! message that tells the user what to fix.

use anyhow::{Result, anyhow};
use log::{debug, warn};
use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts per operation.
pub const MAX_RETRIES: usize = 3;

const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later or set the GH_TOKEN environment variable.")]
    RateLimitExceeded(String),

    #[error("Authentication failed: {0}. Check your GH_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}. GH_TOKEN may lack the required scope.")]
    Forbidden(String),

    /// GitHub rejected the payload, e.g. a release for the tag already exists.
    #[error("Validation failed: {0}")]
    Unprocessable(String),

    #[error("Request error: {0}")]
    ClientError(String),
}

/// `Ok(())` if the request may be retried, the user-facing error otherwise.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        return Ok(());
    };

    match status {
        StatusCode::UNAUTHORIZED => Err(NonRetryableError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN if error.to_string().contains("rate limit") => Err(
            NonRetryableError::RateLimitExceeded("GitHub API rate limit exceeded".to_string()),
        ),
        StatusCode::FORBIDDEN => Err(NonRetryableError::Forbidden(
            "Access to this resource is forbidden".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound(
            error
                .url()
                .map(|u| u.path().to_string())
                .unwrap_or_else(|| "The requested resource was not found".to_string()),
        )),
        StatusCode::UNPROCESSABLE_ENTITY => Err(NonRetryableError::Unprocessable(format!(
            "HTTP {}",
            status.as_u16()
        ))),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        _ => Ok(()),
    }
}

/// Map an `error_for_status()` failure to a [`NonRetryableError`] where applicable.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}

fn is_retryable_error(e: &anyhow::Error) -> bool {
    if e.downcast_ref::<NonRetryableError>().is_some() {
        return false;
    }

    if let Some(error) = e.downcast_ref::<reqwest::Error>() {
        return error.is_connect()
            || error.is_timeout()
            || error.status().is_some_and(|s| s.is_server_error());
    }

    let error_str = format!("{:#}", e).to_lowercase();
    ["connection", "timeout", "reset", "broken pipe", "dns", "resolve"]
        .iter()
        .any(|needle| error_str.contains(needle))
}

/// Run `operation` up to [`MAX_RETRIES`] times.
pub async fn with_retry<F, Fut, T>(operation_name: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable_error(&e) {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }

                if attempt < MAX_RETRIES {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                        operation_name, attempt, MAX_RETRIES, e, RETRY_DELAY_MS
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow!("{}: failed after {} attempts", operation_name, MAX_RETRIES)))
}
