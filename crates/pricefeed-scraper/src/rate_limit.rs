//! Retry with exponential backoff for listing-page fetches.
//!
//! Transient failures (network errors, 429, 5xx) are retried; anything else
//! is returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth another attempt after a backoff delay.
///
/// Retriable:
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::Http`]: connection reset, timeout, TLS failure.
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
///
/// A 4xx other than 429 is final: the site answered and retrying will not
/// change its mind.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Seconds to wait after failed attempt `attempt` (0-based): exponential
/// backoff, stretched to the server's `Retry-After` when that is longer.
fn backoff_delay_secs(err: &ScraperError, backoff_base_secs: u64, attempt: u32) -> u64 {
    let exponential = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => exponential.max(*retry_after_secs),
        _ => exponential,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` extra
/// times and sleeping `backoff_base_secs * 2^attempt` seconds between tries
/// (or the 429 `Retry-After`, whichever is longer).
///
/// With `max_retries = 2` and `backoff_base_secs = 3` a persistently failing
/// fetch is attempted three times, waiting 3 s and then 6 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_delay_secs(&err, backoff_base_secs, attempt);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
