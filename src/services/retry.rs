//! Retry policy evaluation: classifying provider error codes into the
//! retryable classes, deciding eligibility, and computing backoff
//! delays.

use chrono::Duration;

use crate::models::job::{JobStatus, QueueJob};
use crate::models::retry::{ErrorTag, RetryConfig, RetryStrategy};

/// Exponential backoff stops doubling after this many steps so the
/// multiplier stays well inside i32.
const MAX_BACKOFF_DOUBLINGS: u32 = 20;

/// Adds the tag to the policy's retryable set, or removes it when
/// already present.
pub fn toggle_retryable_error(config: &mut RetryConfig, tag: ErrorTag) {
    if !config.retry_on_errors.remove(&tag) {
        config.retry_on_errors.insert(tag);
    }
}

/// Maps a provider error code onto a retryable class.
///
/// Exact statuses win over their band: "429" is rate-limited, not a
/// generic client error. The literal band labels "5xx" and "4xx" are
/// accepted as-is. Anything else, including transport strings like
/// "ECONNRESET", classifies to nothing and is never retryable.
pub fn classify_error_tag(code: &str) -> Option<ErrorTag> {
    let code = code.trim();
    if let Ok(status) = code.parse::<u16>() {
        return match status {
            429 => Some(ErrorTag::RateLimited),
            408 => Some(ErrorTag::Timeout),
            500..=599 => Some(ErrorTag::ServerError),
            400..=499 => Some(ErrorTag::ClientError),
            _ => None,
        };
    }
    match code {
        "5xx" => Some(ErrorTag::ServerError),
        "4xx" => Some(ErrorTag::ClientError),
        _ => None,
    }
}

/// A job qualifies for an automatic retry when it is failed, has
/// attempts left under the policy, and its error classifies into a
/// class the policy opted into. Strategy is not consulted here; a
/// `none` strategy instead yields no delay when scheduling.
pub fn is_retry_eligible(job: &QueueJob, config: &RetryConfig) -> bool {
    if job.status != JobStatus::Failed {
        return false;
    }
    if job.retry_count >= config.max_attempts {
        return false;
    }
    let Some(error) = &job.error else {
        return false;
    };
    let Some(tag) = classify_error_tag(&error.code) else {
        return false;
    };
    config.retry_on_errors.contains(&tag)
}

/// Delay before retry attempt `attempt` (1-based), or `None` when the
/// strategy schedules nothing.
///
/// `custom` is the caller-supplied delay for the `custom` strategy;
/// without one that strategy schedules nothing rather than guessing.
pub fn next_retry_delay(
    strategy: RetryStrategy,
    attempt: u32,
    base: Duration,
    custom: Option<Duration>,
) -> Option<Duration> {
    match strategy {
        RetryStrategy::None => None,
        RetryStrategy::Fixed => Some(base),
        RetryStrategy::Exponential => {
            let doublings = attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
            let factor = 1i32 << doublings;
            Some(base.checked_mul(factor).unwrap_or(Duration::MAX))
        }
        RetryStrategy::Custom => custom,
    }
}

/// Delay for attempt `attempt` under a stored policy. Custom policies
/// carry no delay of their own, so they schedule nothing here.
pub fn schedule_from(config: &RetryConfig, attempt: u32) -> Option<Duration> {
    next_retry_delay(
        config.strategy,
        attempt,
        config.retry_interval.duration(),
        None,
    )
}
