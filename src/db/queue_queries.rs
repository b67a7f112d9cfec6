use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::adapters::{adapt_job, RawJobRow};
use crate::models::job::QueueJob;
use crate::models::rate_limit::{RateLimit, RateLimitOperation};
use crate::models::retry::RetryConfig;
use crate::services::classify::api_provider_label;

const JOB_COLUMNS: &str = "id, job_type, api_provider, status, priority, payload, workflow_name, \
     created_at, queued_at, started_at, processed_at, failed_at, next_retry_at, \
     retry_count, max_retries, retry_strategy, progress, progress_message, \
     error_code, error_message, error_type, error_stack, logs";

fn raw_job_from_row(row: &PgRow) -> Result<RawJobRow, sqlx::Error> {
    Ok(RawJobRow {
        id: row.try_get("id")?,
        job_type: row.try_get("job_type")?,
        api_provider: row.try_get("api_provider")?,
        status: row.try_get("status")?,
        priority: row.try_get("priority")?,
        payload: row.try_get("payload")?,
        workflow_name: row.try_get("workflow_name")?,
        created_at: row.try_get("created_at")?,
        queued_at: row.try_get("queued_at")?,
        started_at: row.try_get("started_at")?,
        processed_at: row.try_get("processed_at")?,
        failed_at: row.try_get("failed_at")?,
        next_retry_at: row.try_get("next_retry_at")?,
        retry_count: row.try_get("retry_count")?,
        max_retries: row.try_get("max_retries")?,
        retry_strategy: row.try_get("retry_strategy")?,
        progress: row.try_get("progress")?,
        progress_message: row.try_get("progress_message")?,
        error_code: row.try_get("error_code")?,
        error_message: row.try_get("error_message")?,
        error_type: row.try_get("error_type")?,
        error_stack: row.try_get("error_stack")?,
        logs: row.try_get("logs")?,
    })
}

/// Fetch the newest jobs, newest first. This is the snapshot everything
/// downstream (filters, stats, the watcher sweep) operates on.
pub async fn fetch_recent_jobs(pool: &PgPool, limit: i64) -> Result<Vec<QueueJob>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {JOB_COLUMNS} FROM api_queue_jobs ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok(adapt_job(raw_job_from_row(row)?)))
        .collect()
}

/// Fetch a single job by id.
pub async fn fetch_job(pool: &PgPool, job_id: Uuid) -> Result<Option<QueueJob>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {JOB_COLUMNS} FROM api_queue_jobs WHERE id = $1"
    ))
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| Ok(adapt_job(raw_job_from_row(&r)?))).transpose()
}

/// Re-queue a job: back to pending with every failure artifact cleared,
/// so the pipeline picks it up as if fresh.
pub async fn retry_job(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE api_queue_jobs
        SET status = 'pending',
            error_code = NULL,
            error_message = NULL,
            error_type = NULL,
            error_stack = NULL,
            processed_at = NULL,
            failed_at = NULL,
            next_retry_at = NULL
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cancel removes the row entirely; there is no tombstone.
pub async fn cancel_job(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM api_queue_jobs WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Pause writes a raw status outside the typed vocabulary; reads fold
/// it back to pending until the pipeline grows a real paused state.
pub async fn pause_job(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE api_queue_jobs SET status = 'paused' WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete failed jobs older than the cutoff. Returns how many went.
pub async fn clear_failed_jobs(pool: &PgPool, days_old: i64) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::days(days_old);
    let result =
        sqlx::query("DELETE FROM api_queue_jobs WHERE status = 'failed' AND created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

/// Annotate a failed job with its computed retry time. The guards make
/// the watcher sweep idempotent: only still-failed, still-unannotated
/// rows are written.
pub async fn schedule_retry(
    pool: &PgPool,
    job_id: Uuid,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE api_queue_jobs
        SET next_retry_at = $2
        WHERE id = $1 AND status = 'failed' AND next_retry_at IS NULL
        "#,
    )
    .bind(job_id)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Latest quota snapshot per provider, with the raw provider key folded
/// into its display label.
pub async fn fetch_rate_limits(pool: &PgPool) -> Result<Vec<RateLimit>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT api_provider, quota_used, quota_limit, quota_percentage,
               unit, resets_at, current_rate, operations
        FROM api_rate_limits
        ORDER BY api_provider
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let raw_provider: String = row.try_get("api_provider")?;
            let quota_used: i64 = row.try_get("quota_used")?;
            let quota_limit: i64 = row.try_get("quota_limit")?;
            let current_rate: i64 = row.try_get("current_rate")?;
            let operations: Option<serde_json::Value> = row.try_get("operations")?;
            let operations: Vec<RateLimitOperation> = operations
                .map(|value| serde_json::from_value(value).unwrap_or_default())
                .unwrap_or_default();

            Ok(RateLimit {
                api_service: api_provider_label(&raw_provider),
                quota_used: quota_used.max(0) as u64,
                quota_limit: quota_limit.max(0) as u64,
                quota_percentage: row.try_get("quota_percentage")?,
                unit: row.try_get("unit")?,
                resets_at: row.try_get("resets_at")?,
                current_rate: current_rate.max(0) as u64,
                operations,
            })
        })
        .collect()
}

/// Stored retry policy for a job kind, or None when the kind has never
/// been configured. Unreadable stored values fall back to the default
/// policy's fields rather than failing the read.
pub async fn load_retry_config(
    pool: &PgPool,
    job_kind: &str,
) -> Result<Option<RetryConfig>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT strategy, max_attempts, retry_interval, retry_on_errors
        FROM queue_retry_configs
        WHERE job_kind = $1
        "#,
    )
    .bind(job_kind)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        let defaults = RetryConfig::default();
        let strategy: String = r.try_get("strategy")?;
        let max_attempts: i32 = r.try_get("max_attempts")?;
        let retry_interval: String = r.try_get("retry_interval")?;
        let retry_on_errors: serde_json::Value = r.try_get("retry_on_errors")?;

        Ok(RetryConfig {
            strategy: strategy.parse().unwrap_or(defaults.strategy),
            max_attempts: max_attempts.clamp(1, 10) as u32,
            retry_interval: retry_interval.parse().unwrap_or(defaults.retry_interval),
            retry_on_errors: serde_json::from_value(retry_on_errors)
                .unwrap_or(defaults.retry_on_errors),
        })
    })
    .transpose()
}

/// Upsert the retry policy for a job kind. Validation happens at the
/// API boundary; this writes whatever it is given.
pub async fn save_retry_config(
    pool: &PgPool,
    job_kind: &str,
    config: &RetryConfig,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO queue_retry_configs
            (job_kind, strategy, max_attempts, retry_interval, retry_on_errors, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        ON CONFLICT (job_kind) DO UPDATE SET
            strategy = EXCLUDED.strategy,
            max_attempts = EXCLUDED.max_attempts,
            retry_interval = EXCLUDED.retry_interval,
            retry_on_errors = EXCLUDED.retry_on_errors,
            updated_at = NOW()
        "#,
    )
    .bind(job_kind)
    .bind(config.strategy.to_string())
    .bind(config.max_attempts as i32)
    .bind(config.retry_interval.to_string())
    .bind(sqlx::types::Json(&config.retry_on_errors))
    .execute(pool)
    .await?;

    Ok(())
}
