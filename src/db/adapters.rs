//! Best-effort adaptation of raw queue rows into typed [`QueueJob`]
//! values.
//!
//! Rows are written by the upstream pipeline, which predates this
//! service and is not strict about its own vocabulary. Adaptation is
//! therefore lossy by design: unknown kinds, statuses, priorities, and
//! strategies fold to documented defaults instead of failing the whole
//! fetch, and the raw `paused` status the pause action writes comes
//! back as `pending`. This module is the only construction path from
//! untrusted rows.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::job::{
    JobErrorInfo, JobKind, JobPayload, JobPriority, JobStatus, LogEntry, QueueJob,
};
use crate::models::retry::RetryStrategy;
use crate::services::classify::{map_raw_provider, simplify_model, truncate_prompt, PROMPT_DISPLAY_LEN};

/// One row of `api_queue_jobs`, exactly as stored. The `payload` JSONB
/// carries the pipeline's own camelCase keys.
#[derive(Debug, Clone)]
pub struct RawJobRow {
    pub id: Uuid,
    pub job_type: Option<String>,
    pub api_provider: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub payload: Value,
    pub workflow_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub queued_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub retry_strategy: Option<String>,
    pub progress: Option<i16>,
    pub progress_message: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_type: Option<String>,
    pub error_stack: Option<String>,
    pub logs: Option<Value>,
}

/// Adapts one raw row. Total: every row becomes a job.
pub fn adapt_job(row: RawJobRow) -> QueueJob {
    let RawJobRow {
        id,
        job_type,
        api_provider,
        status,
        priority,
        payload,
        workflow_name,
        created_at,
        queued_at,
        started_at,
        processed_at,
        failed_at,
        next_retry_at,
        retry_count,
        max_retries,
        retry_strategy,
        progress,
        progress_message,
        error_code,
        error_message,
        error_type,
        error_stack,
        logs,
    } = row;

    let kind = parse_or(job_type.as_deref(), JobKind::Image);
    let status = parse_or(status.as_deref(), JobStatus::Pending);
    let priority = parse_or(priority.as_deref(), JobPriority::Normal);
    let retry_strategy = parse_or(retry_strategy.as_deref(), RetryStrategy::Exponential);

    let error = if error_code.is_some() || error_message.is_some() {
        Some(JobErrorInfo {
            code: error_code.unwrap_or_else(|| "unknown".to_string()),
            message: error_message.unwrap_or_default(),
            kind: error_type.unwrap_or_else(|| "unknown".to_string()),
            stack: error_stack,
        })
    } else {
        None
    };

    QueueJob {
        id: id.to_string(),
        provider: map_raw_provider(api_provider.as_deref()),
        status,
        priority,
        payload: adapt_payload(kind, &payload),
        workflow_name,
        created_at: created_at.unwrap_or(DateTime::UNIX_EPOCH),
        queued_at,
        started_at,
        completed_at: processed_at,
        failed_at,
        next_retry_at,
        retry_count: retry_count.max(0) as u32,
        max_retries: max_retries.max(0) as u32,
        retry_strategy,
        progress: progress.map(|p| p.clamp(0, 100) as u8),
        progress_message,
        error,
        logs: adapt_logs(logs),
    }
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| T::from_str(s).ok()).unwrap_or(default)
}

/// Builds the kind-specific payload from the pipeline's JSONB blob.
/// Display cleanup (model simplification, prompt truncation) happens
/// here so every consumer sees the same values.
fn adapt_payload(kind: JobKind, payload: &Value) -> JobPayload {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let channel_name = text("channelName");
    let video_title = text("videoTitle");

    match kind {
        JobKind::Image => JobPayload::Image {
            prompt: truncate_prompt(
                payload.get("prompt").and_then(Value::as_str),
                PROMPT_DISPLAY_LEN,
            ),
            model: payload
                .get("model")
                .and_then(Value::as_str)
                .map(|m| simplify_model(Some(m))),
            channel_name,
            video_title,
        },
        JobKind::Audio => JobPayload::Audio {
            voice_model: text("voiceModel"),
            file_size: text("fileSize"),
            channel_name,
            video_title,
        },
        JobKind::Video => JobPayload::Video {
            render_pipeline: text("renderPipeline"),
            resolution: text("resolution"),
            file_size: text("fileSize"),
            channel_name,
            video_title,
        },
    }
}

/// Stored order is kept; a malformed log column yields no entries
/// rather than no job.
fn adapt_logs(logs: Option<Value>) -> Vec<LogEntry> {
    logs.map(|value| serde_json::from_value(value).unwrap_or_default())
        .unwrap_or_default()
}
