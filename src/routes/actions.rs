use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queue_queries;
use crate::models::job::{JobStatus, QueueJob};

const DEFAULT_CLEAR_DAYS: i64 = 7;

#[derive(Serialize)]
pub struct ActionResponse {
    pub job_id: Uuid,
    pub action: &'static str,
    pub success: bool,
}

/// Looks up the job an action targets, translating misses and database
/// failures into response codes.
async fn load_target(state: &AppState, job_id: Uuid, action: &str) -> Result<QueueJob, StatusCode> {
    queue_queries::fetch_job(&state.db, job_id)
        .await
        .map_err(|e| {
            tracing::error!(job_id = %job_id, action, error = %e, "Failed to load job for action");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)
}

/// POST /api/v1/queue/jobs/{id}/retry — re-queue a failed job.
///
/// Only failed or retrying jobs accept a retry; anything else conflicts.
pub async fn retry_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, StatusCode> {
    let job = load_target(&state, job_id, "retry").await?;
    if !job.status.can_retry() {
        return Err(StatusCode::CONFLICT);
    }

    let updated = queue_queries::retry_job(&state.db, job_id).await.map_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "Retry action failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !updated {
        return Err(StatusCode::NOT_FOUND);
    }

    tracing::info!(job_id = %job_id, "Job re-queued");
    metrics::counter!("queue_actions_total", "action" => "retry").increment(1);

    Ok(Json(ActionResponse {
        job_id,
        action: "retry",
        success: true,
    }))
}

/// POST /api/v1/queue/jobs/{id}/cancel — remove a job outright.
///
/// Completed and cancelled jobs are already settled and conflict.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, StatusCode> {
    let job = load_target(&state, job_id, "cancel").await?;
    if job.status.is_terminal() {
        return Err(StatusCode::CONFLICT);
    }

    let deleted = queue_queries::cancel_job(&state.db, job_id).await.map_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "Cancel action failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }

    tracing::info!(job_id = %job_id, "Job cancelled and removed");
    metrics::counter!("queue_actions_total", "action" => "cancel").increment(1);

    Ok(Json(ActionResponse {
        job_id,
        action: "cancel",
        success: true,
    }))
}

/// POST /api/v1/queue/jobs/{id}/pause — park a processing job.
pub async fn pause_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ActionResponse>, StatusCode> {
    let job = load_target(&state, job_id, "pause").await?;
    if job.status != JobStatus::Processing {
        return Err(StatusCode::CONFLICT);
    }

    let updated = queue_queries::pause_job(&state.db, job_id).await.map_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "Pause action failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !updated {
        return Err(StatusCode::NOT_FOUND);
    }

    tracing::info!(job_id = %job_id, "Job paused");
    metrics::counter!("queue_actions_total", "action" => "pause").increment(1);

    Ok(Json(ActionResponse {
        job_id,
        action: "pause",
        success: true,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClearFailedQuery {
    pub days: Option<i64>,
}

#[derive(Serialize)]
pub struct ClearFailedResponse {
    pub deleted_count: u64,
}

/// DELETE /api/v1/queue/failed — drop failed jobs older than the given
/// number of days (default 7).
pub async fn clear_failed_jobs(
    State(state): State<AppState>,
    Query(query): Query<ClearFailedQuery>,
) -> Result<Json<ClearFailedResponse>, StatusCode> {
    let days = query.days.unwrap_or(DEFAULT_CLEAR_DAYS);
    if days < 0 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let deleted_count = queue_queries::clear_failed_jobs(&state.db, days)
        .await
        .map_err(|e| {
            tracing::error!(days, error = %e, "Clearing failed jobs failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!(days, deleted_count, "Cleared old failed jobs");
    metrics::counter!("queue_actions_total", "action" => "clear_failed").increment(1);

    Ok(Json(ClearFailedResponse { deleted_count }))
}
