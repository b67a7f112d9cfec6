use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Pressure bucket derived from quota percentage. Ordered so that
/// escalation can be expressed as a plain comparison.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Safe,
    Warning,
    Danger,
    Critical,
}

/// Per-operation quota breakdown, most significant first as supplied by
/// the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimitOperation {
    pub name: String,
    pub cost: u64,
    pub used_today: u64,
}

/// Snapshot of quota consumption for one external API.
///
/// `quota_percentage` is treated as independently supplied rather than
/// recomputed, to tolerate server-side rounding. Over-quota snapshots
/// (used > limit) are valid and displayable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateLimit {
    pub api_service: String,
    pub quota_used: u64,
    pub quota_limit: u64,
    pub quota_percentage: f64,
    /// Billing unit, e.g. "requests" or "units".
    pub unit: String,
    pub resets_at: DateTime<Utc>,
    /// Observed consumption rate in units per hour.
    pub current_rate: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub operations: Vec<RateLimitOperation>,
}
