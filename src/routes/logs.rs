use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queue_queries;
use crate::models::job::{LogEntry, LogLevel};
use crate::services::classify::log_level_color;
use crate::services::filter::filter_logs;
use crate::services::log_export::{export_filename, render_logs};

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub level: Option<String>,
    pub search: Option<String>,
    pub format: Option<String>,
}

#[derive(Serialize)]
struct LogLineView<'a> {
    #[serde(flatten)]
    entry: &'a LogEntry,
    color: &'static str,
}

#[derive(Serialize)]
struct LogsResponse<'a> {
    job_id: Uuid,
    total: usize,
    logs: Vec<LogLineView<'a>>,
}

/// GET /api/v1/queue/jobs/{id}/logs — job log lines, filterable by level
/// and free-text search.
///
/// With `?format=text` the full, unfiltered log is rendered as a plain-text
/// download in the export format instead.
pub async fn get_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<LogsQuery>,
) -> Result<Response, StatusCode> {
    let job = queue_queries::fetch_job(&state.db, job_id)
        .await
        .map_err(|e| {
            tracing::error!(job_id = %job_id, error = %e, "Failed to load job logs");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    if query.format.as_deref() == Some("text") {
        // Exports always carry the complete log, ignoring active filters.
        let body = render_logs(&job.logs);
        let disposition = format!("attachment; filename=\"{}\"", export_filename(&job.id));
        return Ok((
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            body,
        )
            .into_response());
    }

    let level = match query.level.as_deref() {
        Some(raw) => Some(LogLevel::from_str(raw).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?),
        None => None,
    };
    let search = query.search.as_deref().unwrap_or("");
    let logs: Vec<LogLineView> = filter_logs(&job.logs, level, search)
        .into_iter()
        .map(|entry| LogLineView {
            entry,
            color: log_level_color(entry.level),
        })
        .collect();

    Ok(Json(LogsResponse {
        job_id,
        total: logs.len(),
        logs,
    })
    .into_response())
}
