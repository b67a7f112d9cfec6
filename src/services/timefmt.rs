//! Human-facing time rendering for job timelines, rate-limit resets, and
//! processing durations. All functions are total: malformed or absent
//! inputs degrade to a sentinel string, never an error.

use chrono::{DateTime, Utc};

use crate::models::job::JobStatus;

/// Sentinel shown when a timestamp is absent or unusable.
const UNKNOWN: &str = "Unknown";

/// Relative-past phrasing for a timeline entry: "just now", "5m ago",
/// "2h ago", "3d ago". Timestamps in the future clamp to "just now".
pub fn format_time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds().max(0);
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Like [`format_time_ago`] over an optional timestamp.
pub fn format_time_ago_opt(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match ts {
        Some(ts) => format_time_ago(ts, now),
        None => UNKNOWN.to_string(),
    }
}

/// Relative-future phrasing, composed from the largest two non-zero
/// units: "2d 5h", "3h 12m", "45m", "30s". A timestamp already in the
/// past renders as "Now".
pub fn format_time_until(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = ts - now;
    if diff < chrono::Duration::zero() {
        return "Now".to_string();
    }

    let seconds = diff.num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        return format!("{}d {}h", days, hours % 24);
    }
    if hours > 0 {
        return format!("{}h {}m", hours, minutes % 60);
    }
    if minutes > 0 {
        return format!("{}m", minutes);
    }
    format!("{}s", seconds)
}

/// Renders an elapsed duration: "45s" under a minute, "3m 20s" under an
/// hour, "2h 5m" beyond.
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    if seconds < 3600 {
        return format!("{}m {}s", seconds / 60, seconds % 60);
    }
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Rough time-remaining estimate for a processing job, on the assumption
/// that most jobs finish inside three minutes. Anything already finished
/// (or any non-processing status) has no ETA.
pub fn estimate_eta(
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: JobStatus,
    now: DateTime<Utc>,
) -> Option<String> {
    if status == JobStatus::Completed || completed_at.is_some() {
        return None;
    }

    if status == JobStatus::Processing {
        let elapsed_minutes = (now - created_at).num_minutes();
        if elapsed_minutes < 1 {
            return Some("1m".to_string());
        }
        if elapsed_minutes < 3 {
            return Some(format!("{}m", 3 - elapsed_minutes));
        }
        return Some("finishing...".to_string());
    }

    None
}
