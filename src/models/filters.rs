use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::job::{JobStatus, Provider};

/// Date window applied to `QueueJob::created_at`. Always in effect; there
/// is no "all time" option short of a custom range with no from-date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
pub enum DateRange {
    #[serde(rename = "hour")]
    #[strum(serialize = "hour")]
    Hour,
    #[serde(rename = "24h")]
    #[strum(serialize = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Last30Days,
    #[serde(rename = "custom")]
    #[strum(serialize = "custom")]
    Custom,
}

impl Default for DateRange {
    fn default() -> Self {
        DateRange::Last24Hours
    }
}

/// One search specification against the job collection. `None` for status
/// or provider means "all".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub custom_date_from: Option<DateTime<Utc>>,
    /// Held for range pickers; the filter engine applies only the lower
    /// bound of the window.
    #[serde(default)]
    pub custom_date_to: Option<DateTime<Utc>>,
}

impl Default for QueueFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            provider: None,
            date_range: DateRange::default(),
            custom_date_from: None,
            custom_date_to: None,
        }
    }
}

impl QueueFilters {
    /// Lower bound of the active date window. A custom range without a
    /// from-date admits everything, so it resolves to the epoch rather
    /// than rejecting all jobs.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.date_range {
            DateRange::Hour => now - Duration::hours(1),
            DateRange::Last24Hours => now - Duration::hours(24),
            DateRange::Last7Days => now - Duration::days(7),
            DateRange::Last30Days => now - Duration::days(30),
            DateRange::Custom => self.custom_date_from.unwrap_or(DateTime::UNIX_EPOCH),
        }
    }
}
