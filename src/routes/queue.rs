use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queue_queries;
use crate::models::filters::{DateRange, QueueFilters};
use crate::models::job::{JobKind, JobStatus, Provider, QueueJob};
use crate::models::rate_limit::{RateLimit, Severity};
use crate::models::retry::RetryConfig;
use crate::services::alerts::alert_copy;
use crate::services::classify::{
    job_type_label, rate_limit_color, rate_limit_severity, status_badge, status_color,
};
use crate::services::filter::{count_active_filters, filter_jobs, status_tab_counts, StatusTabCounts};
use crate::services::stats::{busiest_rate_limit, queue_stats, QueueStats};
use crate::services::timefmt::{
    estimate_eta, format_duration, format_time_ago, format_time_ago_opt, format_time_until,
};

/// A job as the dashboard consumes it: the stored record plus the
/// derived display fields the clients used to compute for themselves.
#[derive(Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: QueueJob,
    pub kind: JobKind,
    pub kind_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub created_ago: String,
    pub started_ago: String,
    pub completed_ago: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_in: Option<String>,
    pub status_color: &'static str,
    pub status_badge: &'static str,
}

pub(crate) fn job_view(job: &QueueJob, now: DateTime<Utc>) -> JobView {
    JobView {
        kind: job.kind(),
        kind_label: job_type_label(job.kind().as_str()),
        eta: estimate_eta(job.created_at, job.completed_at, job.status, now),
        created_ago: format_time_ago(job.created_at, now),
        started_ago: format_time_ago_opt(job.started_at, now),
        completed_ago: format_time_ago_opt(job.completed_at, now),
        next_retry_in: job.next_retry_at.map(|at| format_time_until(at, now)),
        status_color: status_color(job.status),
        status_badge: status_badge(job.status),
        job: job.clone(),
    }
}

/// Query-string filters for the job list. Absent parameters mean "all";
/// the date window defaults to the last 24 hours.
#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub provider: Option<Provider>,
    pub date_range: Option<DateRange>,
    pub custom_date_from: Option<DateTime<Utc>>,
    pub custom_date_to: Option<DateTime<Utc>>,
}

impl JobsQuery {
    fn into_filters(self) -> QueueFilters {
        QueueFilters {
            search: self.search.unwrap_or_default(),
            status: self.status,
            provider: self.provider,
            date_range: self.date_range.unwrap_or_default(),
            custom_date_from: self.custom_date_from,
            custom_date_to: self.custom_date_to,
        }
    }
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobView>,
    pub counts: StatusTabCounts,
    pub active_filters: usize,
    /// Snapshot size before filtering.
    pub total_unfiltered: usize,
}

/// GET /api/v1/queue/jobs — filtered view over the latest snapshot.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<JobListResponse>, StatusCode> {
    let jobs = queue_queries::fetch_recent_jobs(&state.db, state.config.job_fetch_limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch queue snapshot");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let now = Utc::now();
    let filters = query.into_filters();
    let active_filters = count_active_filters(&filters);
    let filtered = filter_jobs(&jobs, &filters, now);
    let counts = status_tab_counts(filtered.iter().copied());
    let views: Vec<JobView> = filtered.iter().map(|job| job_view(job, now)).collect();

    Ok(Json(JobListResponse {
        jobs: views,
        counts,
        active_filters,
        total_unfiltered: jobs.len(),
    }))
}

/// GET /api/v1/queue/jobs/{id} — one job with its display fields.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, StatusCode> {
    let job = queue_queries::fetch_job(&state.db, job_id)
        .await
        .map_err(|e| {
            tracing::error!(job_id = %job_id, error = %e, "Failed to fetch job");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(job_view(&job, Utc::now())))
}

#[derive(Serialize)]
pub struct BusiestLimit {
    pub api_service: String,
    pub quota_percentage: f64,
    pub severity: Severity,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: QueueStats,
    /// `avg_processing_seconds` rendered for the stat card.
    pub avg_processing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busiest_rate_limit: Option<BusiestLimit>,
}

/// GET /api/v1/queue/stats — headline numbers for the stat cards.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, StatusCode> {
    let jobs = queue_queries::fetch_recent_jobs(&state.db, state.config.job_fetch_limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch queue snapshot");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let limits = queue_queries::fetch_rate_limits(&state.db).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch rate limits");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let stats = queue_stats(&jobs);
    let busiest = busiest_rate_limit(&limits).map(|limit| BusiestLimit {
        api_service: limit.api_service.clone(),
        quota_percentage: limit.quota_percentage,
        severity: rate_limit_severity(limit.quota_percentage),
    });

    Ok(Json(StatsResponse {
        stats,
        avg_processing: format_duration(stats.avg_processing_seconds),
        busiest_rate_limit: busiest,
    }))
}

/// One provider's quota snapshot plus everything the panel derives
/// from it.
#[derive(Serialize)]
pub struct RateLimitView {
    #[serde(flatten)]
    pub limit: RateLimit,
    pub severity: Severity,
    pub color: &'static str,
    pub resets_in: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertBanner>,
}

#[derive(Serialize)]
pub struct AlertBanner {
    pub title: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct RateLimitsResponse {
    pub rate_limits: Vec<RateLimitView>,
}

/// GET /api/v1/queue/rate-limits — quota snapshots with severity.
pub async fn list_rate_limits(
    State(state): State<AppState>,
) -> Result<Json<RateLimitsResponse>, StatusCode> {
    let limits = queue_queries::fetch_rate_limits(&state.db).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch rate limits");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let now = Utc::now();
    let views = limits
        .into_iter()
        .map(|limit| {
            let severity = rate_limit_severity(limit.quota_percentage);
            RateLimitView {
                severity,
                color: rate_limit_color(limit.quota_percentage),
                resets_in: format_time_until(limit.resets_at, now),
                alert: alert_copy(severity).map(|(title, message)| AlertBanner { title, message }),
                limit,
            }
        })
        .collect();

    Ok(Json(RateLimitsResponse { rate_limits: views }))
}

#[derive(Serialize)]
pub struct RetryConfigResponse {
    pub job_kind: JobKind,
    #[serde(flatten)]
    pub config: RetryConfig,
}

/// GET /api/v1/queue/retry-config/{job_kind} — stored policy, or the
/// default when the kind has never been configured.
pub async fn get_retry_config(
    State(state): State<AppState>,
    Path(job_kind): Path<JobKind>,
) -> Result<Json<RetryConfigResponse>, StatusCode> {
    let config = queue_queries::load_retry_config(&state.db, job_kind.as_str())
        .await
        .map_err(|e| {
            tracing::error!(job_kind = %job_kind, error = %e, "Failed to load retry config");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .unwrap_or_default();

    Ok(Json(RetryConfigResponse { job_kind, config }))
}

/// PUT /api/v1/queue/retry-config/{job_kind} — validate and persist.
pub async fn update_retry_config(
    State(state): State<AppState>,
    Path(job_kind): Path<JobKind>,
    Json(config): Json<RetryConfig>,
) -> Result<Json<RetryConfigResponse>, StatusCode> {
    if let Err(report) = config.validate() {
        tracing::warn!(job_kind = %job_kind, error = %report, "Rejected retry config");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    queue_queries::save_retry_config(&state.db, job_kind.as_str(), &config)
        .await
        .map_err(|e| {
            tracing::error!(job_kind = %job_kind, error = %e, "Failed to save retry config");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    metrics::counter!("queue_retry_config_saves_total", "job_kind" => job_kind.as_str())
        .increment(1);

    Ok(Json(RetryConfigResponse { job_kind, config }))
}
