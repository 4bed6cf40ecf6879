//! Retry timing helpers shared by the HTTP collaborators.
//!
//! Only idempotent reads are retried; collection inserts never go through
//! these helpers.

use std::time::Duration;

pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Parses a `Retry-After` header value expressed in whole seconds.
pub fn parse_retry_after_seconds(raw: &str) -> Option<Duration> {
    let seconds = raw.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

pub fn retry_delay(base_delay_ms: u64, attempt: usize, retry_after: Option<Duration>) -> Duration {
    if let Some(delay) = retry_after {
        return delay.max(Duration::from_millis(base_delay_ms));
    }
    let exponent = attempt.saturating_sub(1).min(10) as u32;
    let scaled = base_delay_ms.saturating_mul(2_u64.saturating_pow(exponent));
    Duration::from_millis(scaled.min(MAX_RETRY_DELAY_MS))
}

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{is_retryable_status, parse_retry_after_seconds, retry_delay, truncate_for_error};

    #[test]
    fn unit_retry_delay_doubles_and_caps() {
        assert_eq!(retry_delay(100, 1, None), Duration::from_millis(100));
        assert_eq!(retry_delay(100, 3, None), Duration::from_millis(400));
        assert_eq!(retry_delay(10_000, 9, None), Duration::from_millis(30_000));
    }

    #[test]
    fn unit_retry_delay_prefers_retry_after_floor() {
        assert_eq!(
            retry_delay(50, 1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            retry_delay(50, 1, Some(Duration::ZERO)),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn unit_retryable_status_covers_rate_limit_and_server_errors() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(401));
    }

    #[test]
    fn regression_parse_retry_after_ignores_http_dates() {
        assert_eq!(parse_retry_after_seconds(" 3 "), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after_seconds("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn unit_truncate_for_error_appends_ellipsis() {
        assert_eq!(truncate_for_error("abcdef", 3), "abc...");
        assert_eq!(truncate_for_error("abc", 3), "abc");
    }
}
