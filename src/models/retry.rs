use std::collections::BTreeSet;

use chrono::Duration;
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How retry delays grow between attempts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RetryStrategy {
    /// Failed jobs are never rescheduled.
    None,
    /// Every attempt waits the base interval.
    Fixed,
    /// Attempt n waits base x 2^(n-1).
    Exponential,
    /// Delay is supplied by the caller; the policy only checks it exists.
    Custom,
}

/// The closed set of base intervals offered by the retry policy.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum RetryInterval {
    #[serde(rename = "1min")]
    #[strum(serialize = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    #[strum(serialize = "5min")]
    FiveMinutes,
    #[serde(rename = "10min")]
    #[strum(serialize = "10min")]
    TenMinutes,
    #[serde(rename = "30min")]
    #[strum(serialize = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    #[strum(serialize = "1h")]
    OneHour,
}

impl RetryInterval {
    pub fn duration(&self) -> Duration {
        match self {
            RetryInterval::OneMinute => Duration::minutes(1),
            RetryInterval::FiveMinutes => Duration::minutes(5),
            RetryInterval::TenMinutes => Duration::minutes(10),
            RetryInterval::ThirtyMinutes => Duration::minutes(30),
            RetryInterval::OneHour => Duration::hours(1),
        }
    }
}

/// Error classes a policy can opt into retrying. Codes that fall outside
/// every class (transport errors, application strings) are never
/// retryable, whatever the policy says.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, PartialOrd, Ord,
)]
pub enum ErrorTag {
    #[serde(rename = "429")]
    #[strum(serialize = "429")]
    RateLimited,
    #[serde(rename = "408")]
    #[strum(serialize = "408")]
    Timeout,
    #[serde(rename = "5xx")]
    #[strum(serialize = "5xx")]
    ServerError,
    #[serde(rename = "4xx")]
    #[strum(serialize = "4xx")]
    ClientError,
}

/// Retry policy for one job kind. Mutated only through an explicit save;
/// readers always see a complete value.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RetryConfig {
    #[garde(skip)]
    pub strategy: RetryStrategy,

    #[garde(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Base interval; the initial interval under exponential backoff.
    #[garde(skip)]
    pub retry_interval: RetryInterval,

    #[garde(skip)]
    pub retry_on_errors: BTreeSet<ErrorTag>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Exponential,
            max_attempts: 3,
            retry_interval: RetryInterval::FiveMinutes,
            retry_on_errors: BTreeSet::from([
                ErrorTag::RateLimited,
                ErrorTag::Timeout,
                ErrorTag::ServerError,
            ]),
        }
    }
}
