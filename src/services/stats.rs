//! Aggregate statistics over a queue snapshot: per-status counts,
//! success rate, average processing time, and the busiest rate limit.

use serde::Serialize;

use crate::models::job::{JobStatus, QueueJob};
use crate::models::rate_limit::RateLimit;

/// Headline numbers for the stats cards, computed over one snapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub retrying: usize,
    pub cancelled: usize,
    /// Completed share of finished (completed + failed) jobs, rounded to
    /// whole percent. Zero when nothing has finished yet.
    pub success_rate: u32,
    /// Mean wall time of completed jobs in whole seconds, floored. Only
    /// jobs carrying both start and completion timestamps contribute.
    pub avg_processing_seconds: u64,
}

pub fn queue_stats(jobs: &[QueueJob]) -> QueueStats {
    let mut stats = QueueStats {
        total: jobs.len(),
        ..QueueStats::default()
    };
    for job in jobs {
        match job.status {
            JobStatus::Pending => stats.pending += 1,
            JobStatus::Processing => stats.processing += 1,
            JobStatus::Completed => stats.completed += 1,
            JobStatus::Failed => stats.failed += 1,
            JobStatus::Retrying => stats.retrying += 1,
            JobStatus::Cancelled => stats.cancelled += 1,
        }
    }
    stats.success_rate = success_rate(stats.completed, stats.failed);
    stats.avg_processing_seconds = average_processing_seconds(jobs);
    stats
}

/// Percentage of finished jobs that completed, rounded half-up. A queue
/// with no finished jobs reports 0 rather than dividing by zero.
pub fn success_rate(completed: usize, failed: usize) -> u32 {
    let finished = completed + failed;
    if finished == 0 {
        return 0;
    }
    ((completed as f64 / finished as f64) * 100.0).round() as u32
}

/// Mean processing duration in whole seconds over completed jobs that
/// carry both `started_at` and `completed_at`, floored. Zero when no job
/// qualifies.
pub fn average_processing_seconds(jobs: &[QueueJob]) -> u64 {
    let mut total_ms: i64 = 0;
    let mut count: i64 = 0;
    for job in jobs {
        if job.status != JobStatus::Completed {
            continue;
        }
        let (Some(started), Some(completed)) = (job.started_at, job.completed_at) else {
            continue;
        };
        total_ms += (completed - started).num_milliseconds();
        count += 1;
    }
    if count == 0 {
        return 0;
    }
    (total_ms / count / 1000).max(0) as u64
}

/// The rate limit under the most quota pressure. Scanning keeps the
/// first snapshot at the maximum percentage; snapshots at or below zero
/// never win, so an all-idle board has no busiest limit.
pub fn busiest_rate_limit(limits: &[RateLimit]) -> Option<&RateLimit> {
    let mut best: Option<&RateLimit> = None;
    for limit in limits {
        let current = best.map_or(0.0, |b| b.quota_percentage);
        if limit.quota_percentage > current {
            best = Some(limit);
        }
    }
    best
}
