use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::retry::RetryStrategy;

/// Status of a generation job in the external API queue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retrying,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Retrying => "retrying",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// A terminal job never transitions again. Failed jobs are not terminal
    /// because they can be re-queued.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Statuses from which a retry action is accepted.
    pub fn can_retry(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Retrying)
    }

    /// Statuses counted when computing the success rate.
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Kind of generation work a job performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobKind {
    Image,
    Audio,
    Video,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Image => "image",
            JobKind::Audio => "audio",
            JobKind::Video => "video",
        }
    }
}

/// External provider a job is dispatched to. Raw provider strings from the
/// pipeline are folded into this closed set by `services::classify`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    Runware,
    Gemini,
    #[serde(rename = "GPT")]
    #[strum(serialize = "GPT")]
    Gpt,
    ElevenLabs,
    #[serde(rename = "Google TTS")]
    #[strum(serialize = "Google TTS")]
    GoogleTts,
    #[serde(rename = "FFMPEG")]
    #[strum(serialize = "FFMPEG")]
    Ffmpeg,
}

/// Scheduling priority assigned by the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum JobPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// Severity of a log line emitted by the pipeline while running a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
    Error,
}

/// One append-only log line attached to a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<serde_json::Value>,
}

/// Structured failure detail recorded when a job fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobErrorInfo {
    /// Provider error code, usually an HTTP status ("429", "503") but
    /// sometimes a transport string ("ECONNRESET").
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stack: Option<String>,
}

/// Work-specific payload, keyed by the job kind. Each variant carries only
/// the fields that kind actually produces, so display code never guesses
/// at optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    Image {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        prompt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        channel_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        video_title: Option<String>,
    },
    Audio {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        voice_model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        file_size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        channel_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        video_title: Option<String>,
    },
    Video {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        render_pipeline: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        resolution: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        file_size: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        channel_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        video_title: Option<String>,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Image { .. } => JobKind::Image,
            JobPayload::Audio { .. } => JobKind::Audio,
            JobPayload::Video { .. } => JobKind::Video,
        }
    }

    pub fn channel_name(&self) -> Option<&str> {
        match self {
            JobPayload::Image { channel_name, .. }
            | JobPayload::Audio { channel_name, .. }
            | JobPayload::Video { channel_name, .. } => channel_name.as_deref(),
        }
    }

    pub fn video_title(&self) -> Option<&str> {
        match self {
            JobPayload::Image { video_title, .. }
            | JobPayload::Audio { video_title, .. }
            | JobPayload::Video { video_title, .. } => video_title.as_deref(),
        }
    }

    pub fn file_size(&self) -> Option<&str> {
        match self {
            JobPayload::Image { .. } => None,
            JobPayload::Audio { file_size, .. } | JobPayload::Video { file_size, .. } => {
                file_size.as_deref()
            }
        }
    }
}

/// One unit of outsourced generation work tracked by the queue.
///
/// Jobs are immutable snapshots read from the store; filtering and
/// classification derive new views and never mutate a job in place.
/// `logs` is kept in stored (ascending) order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueJob {
    pub id: String,
    pub provider: Provider,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub payload: JobPayload,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub workflow_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub queued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_retry_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub retry_strategy: RetryStrategy,
    /// Percent complete, only meaningful while `processing`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<JobErrorInfo>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl QueueJob {
    /// Kind is derived from the payload; there is no separate field to
    /// drift out of sync.
    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }
}
