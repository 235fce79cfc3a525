//! Retry with exponential backoff for the robots.txt fetch.
//!
//! Only transient failures are retried: HTTP 429 and network-level errors.
//! Unexpected statuses and parse failures are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::RobotsError;

fn is_retriable(err: &RobotsError) -> bool {
    matches!(err, RobotsError::RateLimited { .. } | RobotsError::Http(_))
}

/// Runs `operation`, retrying transient failures up to `max_retries` more
/// times. The wait before retry `n` (zero-based) is
/// `backoff_base_secs * 2^n` seconds.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, RobotsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RobotsError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient robots.txt error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
