//! Plain-text export of a job's log entries, and the matching parser.
//!
//! The artifact is line-oriented so it stays greppable after download:
//!
//! ```text
//! 2025-06-15T10:00:00.000Z [INFO] Job queued {"position":4}
//! ```
//!
//! One line per entry, a trailing compact-JSON metadata object only
//! when the entry carries one, and no trailing newline.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::models::job::{LogEntry, LogLevel};

#[derive(Debug, Error)]
pub enum LogParseError {
    #[error("line {line}: missing '[LEVEL]' marker")]
    MissingLevel { line: usize },
    #[error("line {line}: unknown log level {level:?}")]
    UnknownLevel { line: usize, level: String },
    #[error("line {line}: bad timestamp {value:?}")]
    BadTimestamp { line: usize, value: String },
}

/// Renders entries into the export format, in the order given.
pub fn render_logs(logs: &[LogEntry]) -> String {
    let mut lines = Vec::with_capacity(logs.len());
    for entry in logs {
        let mut line = format!(
            "{} [{}] {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.level,
            entry.message
        );
        if let Some(metadata) = &entry.metadata {
            if let Ok(json) = serde_json::to_string(metadata) {
                line.push(' ');
                line.push_str(&json);
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Download filename for a job's log artifact.
pub fn export_filename(job_id: &str) -> String {
    format!("job-{}-logs.txt", job_id)
}

/// Parses an export back into entries. Blank lines are skipped; any
/// malformed line fails the whole parse with its 1-based line number.
///
/// Metadata is recovered by scanning the tail for the earliest `" {"`
/// whose suffix is valid JSON, which keeps nested objects intact and
/// leaves brace-free messages untouched.
pub fn parse_logs(text: &str) -> Result<Vec<LogEntry>, LogParseError> {
    let mut entries = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        let (timestamp_text, rest) = raw_line
            .split_once(' ')
            .ok_or(LogParseError::MissingLevel { line })?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp_text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| LogParseError::BadTimestamp {
                line,
                value: timestamp_text.to_string(),
            })?;

        let bracketed = rest
            .strip_prefix('[')
            .ok_or(LogParseError::MissingLevel { line })?;
        let (level_text, after_level) = bracketed
            .split_once("] ")
            .or_else(|| bracketed.split_once(']'))
            .ok_or(LogParseError::MissingLevel { line })?;
        let level = LogLevel::from_str(level_text).map_err(|_| LogParseError::UnknownLevel {
            line,
            level: level_text.to_string(),
        })?;

        let (message, metadata) = split_metadata(after_level);
        entries.push(LogEntry {
            timestamp,
            level,
            message: message.to_string(),
            metadata,
        });
    }
    Ok(entries)
}

/// Splits a rendered message from its trailing metadata object, if any.
fn split_metadata(text: &str) -> (&str, Option<serde_json::Value>) {
    for (pos, _) in text.match_indices(" {") {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[pos + 1..]) {
            return (&text[..pos], Some(value));
        }
    }
    (text, None)
}
