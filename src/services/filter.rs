//! In-memory filter engine for the queue views.
//!
//! All predicates are conjunctive and evaluation never reorders jobs:
//! the output is the input sequence minus the rows that fail a
//! predicate. An empty search string matches everything.

use chrono::{DateTime, Utc};

use crate::models::filters::QueueFilters;
use crate::models::job::{JobStatus, LogEntry, LogLevel, QueueJob};

/// Per-status counts backing the status tabs. Computed over whatever
/// slice the caller passes, usually the already-filtered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatusTabCounts {
    pub all: usize,
    pub pending: usize,
    pub processing: usize,
    pub failed: usize,
}

/// Applies search, status, provider, and date-window predicates in
/// order, keeping original ordering.
pub fn filter_jobs<'a>(
    jobs: &'a [QueueJob],
    filters: &QueueFilters,
    now: DateTime<Utc>,
) -> Vec<&'a QueueJob> {
    let search = filters.search.to_lowercase();
    let window_start = filters.window_start(now);

    jobs.iter()
        .filter(|job| search.is_empty() || matches_search(job, &search))
        .filter(|job| filters.status.is_none_or(|status| job.status == status))
        .filter(|job| {
            filters
                .provider
                .is_none_or(|provider| job.provider == provider)
        })
        .filter(|job| job.created_at >= window_start)
        .collect()
}

/// Case-insensitive substring match over id, kind, channel name, video
/// title, and workflow name. `needle` must already be lowercased.
fn matches_search(job: &QueueJob, needle: &str) -> bool {
    if job.id.to_lowercase().contains(needle) {
        return true;
    }
    if job.kind().as_str().contains(needle) {
        return true;
    }
    let field_matches = |field: Option<&str>| {
        field.is_some_and(|value| value.to_lowercase().contains(needle))
    };
    field_matches(job.payload.channel_name())
        || field_matches(job.payload.video_title())
        || field_matches(job.workflow_name.as_deref())
}

/// Number of engaged filters, for the "clear filters" affordance. The
/// date window always has a value and is not counted.
pub fn count_active_filters(filters: &QueueFilters) -> usize {
    let mut count = 0;
    if !filters.search.is_empty() {
        count += 1;
    }
    if filters.status.is_some() {
        count += 1;
    }
    if filters.provider.is_some() {
        count += 1;
    }
    count
}

/// Narrows a job's log lines by level and message substring.
pub fn filter_logs<'a>(
    logs: &'a [LogEntry],
    level: Option<LogLevel>,
    search: &str,
) -> Vec<&'a LogEntry> {
    let needle = search.to_lowercase();
    logs.iter()
        .filter(|entry| level.is_none_or(|wanted| entry.level == wanted))
        .filter(|entry| needle.is_empty() || entry.message.to_lowercase().contains(&needle))
        .collect()
}

pub fn status_tab_counts<'a>(jobs: impl IntoIterator<Item = &'a QueueJob>) -> StatusTabCounts {
    let mut counts = StatusTabCounts::default();
    for job in jobs {
        counts.all += 1;
        match job.status {
            JobStatus::Pending => counts.pending += 1,
            JobStatus::Processing => counts.processing += 1,
            JobStatus::Failed => counts.failed += 1,
            _ => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filters::DateRange;
    use crate::models::job::{JobPayload, JobPriority, Provider};
    use crate::models::retry::RetryStrategy;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn sample_job(id: &str) -> QueueJob {
        QueueJob {
            id: id.to_string(),
            provider: Provider::Runware,
            status: JobStatus::Pending,
            priority: JobPriority::Normal,
            payload: JobPayload::Image {
                prompt: Some("A futuristic city skyline at dusk".to_string()),
                model: Some("Rundiffusion 130".to_string()),
                channel_name: Some("Tech Insights Daily".to_string()),
                video_title: Some("Top 10 AI Tools for 2025".to_string()),
            },
            workflow_name: Some("Thumbnail Pipeline".to_string()),
            created_at: now() - chrono::Duration::hours(1),
            queued_at: None,
            started_at: None,
            completed_at: None,
            failed_at: None,
            next_retry_at: None,
            retry_count: 0,
            max_retries: 3,
            retry_strategy: RetryStrategy::Exponential,
            progress: None,
            progress_message: None,
            error: None,
            logs: Vec::new(),
        }
    }

    #[test]
    fn test_empty_filters_keep_everything_in_order() {
        let jobs = vec![sample_job("job-a"), sample_job("job-b"), sample_job("job-c")];
        let filtered = filter_jobs(&jobs, &QueueFilters::default(), now());
        let ids: Vec<_> = filtered.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["job-a", "job-b", "job-c"]);
    }

    #[test]
    fn test_search_covers_all_fields() {
        let mut by_channel = sample_job("job-1");
        if let JobPayload::Image { channel_name, .. } = &mut by_channel.payload {
            *channel_name = Some("Gaming Central".to_string());
        }
        let mut by_workflow = sample_job("job-2");
        by_workflow.workflow_name = Some("Nightly Render".to_string());
        let by_id = sample_job("special-3");
        let jobs = vec![by_channel, by_workflow, by_id];

        let search = |term: &str| {
            let filters = QueueFilters {
                search: term.to_string(),
                ..QueueFilters::default()
            };
            filter_jobs(&jobs, &filters, now())
                .iter()
                .map(|j| j.id.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(search("gaming"), vec!["job-1"]);
        assert_eq!(search("NIGHTLY"), vec!["job-2"]);
        assert_eq!(search("special"), vec!["special-3"]);
        // Kind and video title hit every sample.
        assert_eq!(search("image").len(), 3);
        assert_eq!(search("ai tools").len(), 3);
        assert!(search("no such term").is_empty());
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let mut failed = sample_job("job-failed");
        failed.status = JobStatus::Failed;
        let mut failed_gemini = sample_job("job-failed-gemini");
        failed_gemini.status = JobStatus::Failed;
        failed_gemini.provider = Provider::Gemini;
        let jobs = vec![sample_job("job-ok"), failed, failed_gemini];

        let filters = QueueFilters {
            status: Some(JobStatus::Failed),
            provider: Some(Provider::Gemini),
            ..QueueFilters::default()
        };
        let filtered = filter_jobs(&jobs, &filters, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "job-failed-gemini");
    }

    #[test]
    fn test_date_window_lower_bound_is_inclusive() {
        let mut at_boundary = sample_job("job-boundary");
        at_boundary.created_at = now() - chrono::Duration::hours(24);
        let mut too_old = sample_job("job-old");
        too_old.created_at = now() - chrono::Duration::hours(24) - chrono::Duration::seconds(1);
        let jobs = vec![at_boundary, too_old];

        let filtered = filter_jobs(&jobs, &QueueFilters::default(), now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "job-boundary");
    }

    #[test]
    fn test_custom_range_without_start_spans_all_history() {
        let mut ancient = sample_job("job-ancient");
        ancient.created_at = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let jobs = vec![ancient];

        let filters = QueueFilters {
            date_range: DateRange::Custom,
            ..QueueFilters::default()
        };
        assert_eq!(filter_jobs(&jobs, &filters, now()).len(), 1);
    }

    #[test]
    fn test_active_filter_count_ignores_date_range() {
        let mut filters = QueueFilters::default();
        assert_eq!(count_active_filters(&filters), 0);

        filters.date_range = DateRange::Last7Days;
        assert_eq!(count_active_filters(&filters), 0);

        filters.search = "render".to_string();
        filters.status = Some(JobStatus::Failed);
        filters.provider = Some(Provider::Ffmpeg);
        assert_eq!(count_active_filters(&filters), 3);
    }

    #[test]
    fn test_filter_logs_by_level_and_text() {
        let logs = vec![
            LogEntry {
                timestamp: now(),
                level: LogLevel::Info,
                message: "Job queued for processing".to_string(),
                metadata: None,
            },
            LogEntry {
                timestamp: now(),
                level: LogLevel::Error,
                message: "Upstream returned 429".to_string(),
                metadata: None,
            },
            LogEntry {
                timestamp: now(),
                level: LogLevel::Error,
                message: "Giving up after retries".to_string(),
                metadata: None,
            },
        ];

        assert_eq!(filter_logs(&logs, None, "").len(), 3);
        assert_eq!(filter_logs(&logs, Some(LogLevel::Error), "").len(), 2);
        let narrowed = filter_logs(&logs, Some(LogLevel::Error), "429");
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].message, "Upstream returned 429");
    }

    #[test]
    fn test_tab_counts_track_exact_statuses() {
        let mut processing = sample_job("job-p");
        processing.status = JobStatus::Processing;
        let mut failed = sample_job("job-f");
        failed.status = JobStatus::Failed;
        let mut retrying = sample_job("job-r");
        retrying.status = JobStatus::Retrying;
        let jobs = vec![sample_job("job-a"), processing, failed, retrying];

        let counts = status_tab_counts(&jobs);
        assert_eq!(counts.all, 4);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.failed, 1);
    }
}
