use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{header, HeaderMap};

#[derive(Debug, Clone)]
pub struct RateLimitSnapshot {
    pub limit: i64,
    pub remaining: i64,
    pub reset: DateTime<Utc>,
}

pub fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitSnapshot> {
    let limit = header_i64(headers, "x-ratelimit-limit")?;
    let remaining = header_i64(headers, "x-ratelimit-remaining")?;
    let reset_ts = header_i64(headers, "x-ratelimit-reset")?;
    let reset = DateTime::from_timestamp(reset_ts, 0)?;
    Some(RateLimitSnapshot {
        limit,
        remaining,
        reset,
    })
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
}

#[derive(Debug, Clone)]
pub struct RetryAdvice {
    pub wait: Duration,
    pub reason: &'static str,
}

pub fn parse_retry_after(headers: &HeaderMap) -> Option<RetryAdvice> {
    let value = headers.get(header::RETRY_AFTER)?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(RetryAdvice {
            wait: Duration::from_secs(seconds),
            reason: "retry_after",
        });
    }
    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = std::time::SystemTime::now();
        if let Ok(wait) = date.duration_since(now) {
            return Some(RetryAdvice {
                wait,
                reason: "retry_after_date",
            });
        }
    }
    None
}

/// How long a rate-limited response asks us to pause. `Retry-After` wins;
/// otherwise a drained primary quota waits until the reset timestamp. One
/// second of slack covers clock skew against the host.
pub fn rate_limit_wait(headers: &HeaderMap, now: DateTime<Utc>) -> Option<RetryAdvice> {
    if let Some(advice) = parse_retry_after(headers) {
        return Some(RetryAdvice {
            wait: advice.wait + Duration::from_secs(1),
            reason: advice.reason,
        });
    }

    let snapshot = parse_rate_limit(headers)?;
    if snapshot.remaining > 0 {
        return None;
    }
    let wait = (snapshot.reset - now).to_std().unwrap_or_default();
    Some(RetryAdvice {
        wait: wait + Duration::from_secs(1),
        reason: "rate_limit_reset",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn limit_headers(limit: &str, remaining: &str, reset: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_str(limit).unwrap());
        headers.insert(
            "x-ratelimit-remaining",
            HeaderValue::from_str(remaining).unwrap(),
        );
        headers.insert("x-ratelimit-reset", HeaderValue::from_str(reset).unwrap());
        headers
    }

    #[test]
    fn parses_rate_limit_headers() {
        let headers = limit_headers("5000", "4999", "1700000000");
        let snapshot = parse_rate_limit(&headers).unwrap();
        assert_eq!(snapshot.limit, 5000);
        assert_eq!(snapshot.remaining, 4999);
        assert_eq!(snapshot.reset.timestamp(), 1_700_000_000);
    }

    #[test]
    fn no_wait_while_quota_remains() {
        let headers = limit_headers("5000", "10", "1700000000");
        let now = DateTime::from_timestamp(1_699_999_000, 0).unwrap();
        assert!(rate_limit_wait(&headers, now).is_none());
    }

    #[test]
    fn drained_quota_waits_until_reset() {
        let headers = limit_headers("5000", "0", "1700000060");
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let advice = rate_limit_wait(&headers, now).unwrap();
        assert_eq!(advice.wait, Duration::from_secs(61));
        assert_eq!(advice.reason, "rate_limit_reset");
    }

    #[test]
    fn retry_after_seconds_takes_precedence() {
        let mut headers = limit_headers("5000", "0", "1700009999");
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("7"));
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let advice = rate_limit_wait(&headers, now).unwrap();
        assert_eq!(advice.wait, Duration::from_secs(8));
        assert_eq!(advice.reason, "retry_after");
    }

    #[test]
    fn reset_in_the_past_means_no_sleep_beyond_slack() {
        let headers = limit_headers("5000", "0", "1700000000");
        let now = DateTime::from_timestamp(1_700_000_500, 0).unwrap();
        let advice = rate_limit_wait(&headers, now).unwrap();
        assert_eq!(advice.wait, Duration::from_secs(1));
    }
}
