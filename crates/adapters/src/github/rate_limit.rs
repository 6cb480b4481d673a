//! Detection of GitHub rate limit responses

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// Secondary limits without any hint ask clients to back off for a minute
const FALLBACK_WAIT: Duration = Duration::from_secs(60);

/// How long to wait before retrying, or `None` if the response is not a
/// rate limit rejection.
///
/// Primary limits come back as 403/429 with `x-ratelimit-remaining: 0`;
/// secondary limits carry `retry-after`.
pub(crate) fn retry_delay(status: StatusCode, headers: &HeaderMap, now_unix: i64) -> Option<Duration> {
    let remaining = header_number(headers, "x-ratelimit-remaining");
    let retry_after = header_number(headers, RETRY_AFTER.as_str());

    let limited = match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => remaining == Some(0) || retry_after.is_some(),
        _ => false,
    };

    if !limited {
        return None;
    }

    if let Some(secs) = retry_after {
        return Some(Duration::from_secs(secs.max(0) as u64));
    }

    if remaining == Some(0) {
        if let Some(reset) = header_number(headers, "x-ratelimit-reset") {
            return Some(Duration::from_secs(reset.saturating_sub(now_unix).max(0) as u64));
        }
    }

    Some(FALLBACK_WAIT)
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
}
