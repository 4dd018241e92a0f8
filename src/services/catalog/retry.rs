//! Retry and pacing rules for upstream catalog requests

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header::HeaderMap, StatusCode};

/// Exponential backoff settings for a single upstream request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound for any single wait, including server-provided ones
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Policy tuned for Jikan's 3 req/s and 60 req/min limits
    pub fn jikan(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before retry number `attempt` (0-based)
    ///
    /// A `Retry-After` value from the server wins over the computed backoff,
    /// both are capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_delay);
        }

        let factor = self.backoff_multiplier.powi(attempt as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        Duration::from_millis(millis.min(self.max_delay.as_millis() as f64) as u64)
    }

    /// Whether a response status is worth retrying
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// Whether a transport error is worth retrying
    pub fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

/// Parses a `Retry-After` header given in seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Upstream request limiter shared by every call of one client
pub type RequestLimiter = DefaultDirectRateLimiter;

/// Builds a limiter allowing one request per `interval` with short bursts
///
/// A zero interval disables limiting.
pub fn request_limiter(interval: Duration, burst: u32) -> RequestLimiter {
    let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(interval)
        .map(|quota| quota.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));

    RateLimiter::direct(quota)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::jikan(3);
        assert_eq!(policy.delay_for(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::jikan(10);
        assert_eq!(policy.delay_for(8, None), Duration::from_secs(30));
    }

    #[test]
    fn test_retry_after_overrides_backoff() {
        let policy = RetryPolicy::jikan(3);
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(600))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(RetryPolicy::is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(RetryPolicy::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_parse_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test]
    async fn test_limiter_allows_burst_then_spaces_requests() {
        let limiter = request_limiter(Duration::from_millis(40), 3);
        let start = std::time::Instant::now();

        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());

        limiter.until_ready().await;
        limiter.until_ready().await;

        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[tokio::test]
    async fn test_zero_interval_is_unlimited() {
        let limiter = request_limiter(Duration::ZERO, 3);
        for _ in 0..100 {
            assert!(limiter.check().is_ok());
        }
    }
}
