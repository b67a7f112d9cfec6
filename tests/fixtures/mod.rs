//! Shared job fixtures for queue snapshot tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use api_queue_monitor::models::job::{
    JobErrorInfo, JobPayload, JobPriority, JobStatus, LogEntry, LogLevel, Provider, QueueJob,
};
use api_queue_monitor::models::retry::RetryStrategy;

/// Fixed reference time so age and window assertions never depend on
/// the wall clock.
pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 10, 12, 0, 0).unwrap()
}

/// Baseline image job created `hours_ago` hours before the anchor.
pub fn image_job(id: &str, status: JobStatus, hours_ago: i64) -> QueueJob {
    let created_at = anchor() - Duration::hours(hours_ago);
    QueueJob {
        id: id.to_string(),
        provider: Provider::Runware,
        status,
        priority: JobPriority::Normal,
        payload: JobPayload::Image {
            prompt: Some("A futuristic cityscape at sunset".to_string()),
            model: Some("Rundiffusion 130".to_string()),
            channel_name: Some("TechFlow Tutorials".to_string()),
            video_title: Some("How to Build a Viral YouTube Channel".to_string()),
        },
        workflow_name: Some("daily-shorts".to_string()),
        created_at,
        queued_at: Some(created_at),
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

/// Audio narration job for a different channel, useful for search
/// assertions.
pub fn audio_job(id: &str, status: JobStatus, hours_ago: i64) -> QueueJob {
    QueueJob {
        provider: Provider::ElevenLabs,
        payload: JobPayload::Audio {
            voice_model: Some("Eleven Turbo v2".to_string()),
            file_size: Some("2.4 MB".to_string()),
            channel_name: Some("DesignDaily".to_string()),
            video_title: Some("The Future of AI Development".to_string()),
        },
        workflow_name: Some("weekly-longform".to_string()),
        ..image_job(id, status, hours_ago)
    }
}

/// Render job on the local pipeline.
pub fn video_job(id: &str, status: JobStatus, hours_ago: i64) -> QueueJob {
    QueueJob {
        provider: Provider::Ffmpeg,
        payload: JobPayload::Video {
            render_pipeline: Some("Pipeline A".to_string()),
            resolution: Some("1080p".to_string()),
            file_size: Some("148 MB".to_string()),
            channel_name: Some("TechFlow Tutorials".to_string()),
            video_title: Some("Next.js 15 App Router Deep Dive".to_string()),
        },
        ..image_job(id, status, hours_ago)
    }
}

/// Mark a job completed with the given processing time.
pub fn with_run(mut job: QueueJob, run_minutes: i64) -> QueueJob {
    job.started_at = Some(job.created_at + Duration::minutes(1));
    job.completed_at = Some(job.created_at + Duration::minutes(1 + run_minutes));
    job
}

/// Mark a job failed with the given error code.
pub fn with_error(mut job: QueueJob, code: &str, retry_count: u32) -> QueueJob {
    job.status = JobStatus::Failed;
    job.retry_count = retry_count;
    job.failed_at = Some(job.created_at + Duration::minutes(2));
    job.error = Some(JobErrorInfo {
        code: code.to_string(),
        message: "Provider rejected request".to_string(),
        kind: "ApiError".to_string(),
        stack: None,
    });
    job
}

/// Attach a small log history to a job.
pub fn with_logs(mut job: QueueJob) -> QueueJob {
    job.logs = vec![
        LogEntry {
            timestamp: job.created_at,
            level: LogLevel::Info,
            message: "Job accepted".to_string(),
            metadata: Some(serde_json::json!({"queuePosition": 2})),
        },
        LogEntry {
            timestamp: job.created_at + Duration::seconds(30),
            level: LogLevel::Debug,
            message: "Provider session opened".to_string(),
            metadata: None,
        },
    ];
    job
}

/// A mixed snapshot spanning several days: recent work inside the
/// default 24h window plus older history outside it.
pub fn jobs_spanning_days() -> Vec<QueueJob> {
    vec![
        image_job("img-proc", JobStatus::Processing, 1),
        image_job("img-pending", JobStatus::Pending, 2),
        with_run(image_job("img-done", JobStatus::Completed, 3), 4),
        with_error(image_job("img-failed", JobStatus::Failed, 5), "429", 1),
        audio_job("aud-pending", JobStatus::Pending, 6),
        with_run(audio_job("aud-done", JobStatus::Completed, 20), 9),
        video_job("vid-proc", JobStatus::Processing, 12),
        // Outside the default 24h window.
        with_run(image_job("img-old", JobStatus::Completed, 30), 6),
        with_error(video_job("vid-old-failed", JobStatus::Failed, 72), "500", 3),
        audio_job("aud-ancient", JobStatus::Cancelled, 24 * 40),
    ]
}
