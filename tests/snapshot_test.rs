//! Pure pipeline tests: filtering, counting and stats over an in-memory
//! queue snapshot, plus the JSON wire shape of job records.

mod fixtures;

use fixtures::*;

use api_queue_monitor::models::filters::{DateRange, QueueFilters};
use api_queue_monitor::models::job::{JobStatus, Provider};
use api_queue_monitor::services::filter::{filter_jobs, status_tab_counts};
use api_queue_monitor::services::stats::queue_stats;

#[test]
fn test_default_window_keeps_last_24h_in_order() {
    let jobs = jobs_spanning_days();
    let filtered = filter_jobs(&jobs, &QueueFilters::default(), anchor());

    let ids: Vec<&str> = filtered.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "img-proc",
            "img-pending",
            "img-done",
            "img-failed",
            "aud-pending",
            "aud-done",
            "vid-proc",
        ]
    );
}

#[test]
fn test_hour_window_boundary_is_inclusive() {
    let jobs = jobs_spanning_days();
    let filters = QueueFilters {
        date_range: DateRange::Hour,
        ..QueueFilters::default()
    };

    // img-proc was created exactly one hour before the anchor.
    let filtered = filter_jobs(&jobs, &filters, anchor());
    let ids: Vec<&str> = filtered.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, ["img-proc"]);
}

#[test]
fn test_filters_combine_conjunctively() {
    let jobs = jobs_spanning_days();
    let filters = QueueFilters {
        search: "TechFlow".to_string(),
        status: Some(JobStatus::Processing),
        ..QueueFilters::default()
    };

    let filtered = filter_jobs(&jobs, &filters, anchor());
    let ids: Vec<&str> = filtered.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, ["img-proc", "vid-proc"]);

    // Dropping a predicate can only widen the result.
    let relaxed = QueueFilters {
        search: "TechFlow".to_string(),
        ..QueueFilters::default()
    };
    let relaxed_ids: Vec<&str> = filter_jobs(&jobs, &relaxed, anchor())
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert!(ids.iter().all(|id| relaxed_ids.contains(id)));
    assert!(relaxed_ids.len() > ids.len());
}

#[test]
fn test_week_window_keeps_exactly_the_last_seven_days() {
    let jobs = jobs_spanning_days();
    let filters = QueueFilters {
        date_range: DateRange::Last7Days,
        ..QueueFilters::default()
    };

    let filtered = filter_jobs(&jobs, &filters, anchor());
    assert_eq!(filtered.len(), 9);
    assert!(filtered.iter().all(|j| j.id != "aud-ancient"));
}

#[test]
fn test_search_matches_kind_and_title() {
    let jobs = jobs_spanning_days();

    let by_kind = QueueFilters {
        search: "audio".to_string(),
        ..QueueFilters::default()
    };
    let ids: Vec<&str> = filter_jobs(&jobs, &by_kind, anchor())
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(ids, ["aud-pending", "aud-done"]);

    let by_title = QueueFilters {
        search: "next.js".to_string(),
        date_range: DateRange::Last7Days,
        ..QueueFilters::default()
    };
    let ids: Vec<&str> = filter_jobs(&jobs, &by_title, anchor())
        .iter()
        .map(|j| j.id.as_str())
        .collect();
    assert_eq!(ids, ["vid-proc", "vid-old-failed"]);
}

#[test]
fn test_provider_filter() {
    let jobs = jobs_spanning_days();
    let filters = QueueFilters {
        provider: Some(Provider::ElevenLabs),
        ..QueueFilters::default()
    };

    let filtered = filter_jobs(&jobs, &filters, anchor());
    assert!(filtered.iter().all(|j| j.provider == Provider::ElevenLabs));
    assert_eq!(filtered.len(), 2);
}

#[test]
fn test_tab_counts_follow_the_filtered_view() {
    let jobs = jobs_spanning_days();
    let filtered = filter_jobs(&jobs, &QueueFilters::default(), anchor());
    let counts = status_tab_counts(filtered.iter().copied());

    assert_eq!(counts.all, 7);
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.processing, 2);
    assert_eq!(counts.failed, 1);
}

#[test]
fn test_stats_over_full_snapshot() {
    let jobs = jobs_spanning_days();
    let stats = queue_stats(&jobs);

    assert_eq!(stats.total, 10);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.processing, 2);
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.retrying, 0);
    assert_eq!(stats.cancelled, 1);
    // 3 completed out of 5 finished.
    assert_eq!(stats.success_rate, 60);
    // Runs of 4, 9 and 6 minutes average to 380 seconds.
    assert_eq!(stats.avg_processing_seconds, 380);
}

#[test]
fn test_job_wire_shape() {
    let job = with_logs(with_error(
        image_job("img-wire", JobStatus::Failed, 5),
        "429",
        1,
    ));
    let value = serde_json::to_value(&job).expect("job serializes");

    assert_eq!(value["status"], "failed");
    assert_eq!(value["payload"]["kind"], "image");
    assert_eq!(value["payload"]["channel_name"], "TechFlow Tutorials");
    assert_eq!(value["error"]["type"], "ApiError");
    assert_eq!(value["error"]["code"], "429");
    assert_eq!(value["logs"][0]["level"], "INFO");
    assert_eq!(value["retry_strategy"], "exponential");
    // Unset timestamps are omitted, not null.
    assert!(value.get("completed_at").is_none());
}
