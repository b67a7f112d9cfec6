use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_queue_monitor::{
    config::AppConfig,
    db::{self, queue_queries},
    models::job::{JobKind, JobStatus, QueueJob},
    models::retry::RetryConfig,
    services::alerts::AlertNotifier,
    services::refresh::RefreshScheduler,
    services::{retry, stats},
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting queue watcher");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Expose watcher metrics on its own scrape port
    let metrics_addr: SocketAddr = config
        .watcher_metrics_addr
        .parse()
        .expect("Invalid WATCHER_METRICS_ADDR");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("Failed to install Prometheus metrics exporter");

    // Register watcher metrics
    metrics::describe_histogram!("queue_sweep_seconds", "Time to run one watcher sweep");
    metrics::describe_gauge!(
        "queue_jobs_by_status",
        "Jobs in the latest snapshot, by status"
    );
    metrics::describe_gauge!(
        "rate_limit_quota_percent",
        "Latest quota consumption per external API"
    );
    metrics::describe_counter!(
        "queue_retries_scheduled_total",
        "Failed jobs annotated with a retry time, by job kind"
    );
    metrics::describe_counter!(
        "rate_limit_alerts_total",
        "Escalation alerts delivered to the ops webhook"
    );

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Alerts are optional; without a webhook the sweep only records gauges.
    let notifier = match &config.alert_webhook_url {
        Some(url) => {
            let notifier =
                AlertNotifier::new(url.clone()).expect("Failed to initialize alert notifier");
            Some(Arc::new(Mutex::new(notifier)))
        }
        None => {
            tracing::info!("ALERT_WEBHOOK_URL not set, rate limit alerts disabled");
            None
        }
    };

    let fetch_limit = config.job_fetch_limit;
    let sweep_pool = db_pool.clone();
    let mut scheduler = RefreshScheduler::new(
        Duration::from_secs(config.watch_interval_secs),
        move || {
            let pool = sweep_pool.clone();
            let notifier = notifier.clone();
            async move {
                sweep(pool, fetch_limit, notifier).await;
            }
        },
    );
    if let Some(secs) = config.refresh_timeout_secs {
        scheduler = scheduler.with_timeout(Duration::from_secs(secs));
    }

    scheduler.start();
    tracing::info!(
        interval_secs = config.watch_interval_secs,
        "Watcher sweeping on interval"
    );

    // Take an immediate first look instead of waiting out a full interval.
    scheduler.manual_refresh().await;

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    tracing::info!("Shutdown signal received, stopping watcher");
    scheduler.stop();
}

/// One watcher pass: snapshot the queue, publish gauges, annotate due
/// retries, and escalate rate limit pressure. Every step logs and
/// carries on rather than aborting the sweep.
async fn sweep(pool: PgPool, fetch_limit: i64, notifier: Option<Arc<Mutex<AlertNotifier>>>) {
    let started = std::time::Instant::now();

    let jobs = match queue_queries::fetch_recent_jobs(&pool, fetch_limit).await {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!(error = %e, "Sweep could not fetch jobs");
            return;
        }
    };

    let snapshot = stats::queue_stats(&jobs);
    metrics::gauge!("queue_jobs_by_status", "status" => "pending").set(snapshot.pending as f64);
    metrics::gauge!("queue_jobs_by_status", "status" => "processing")
        .set(snapshot.processing as f64);
    metrics::gauge!("queue_jobs_by_status", "status" => "completed").set(snapshot.completed as f64);
    metrics::gauge!("queue_jobs_by_status", "status" => "failed").set(snapshot.failed as f64);
    metrics::gauge!("queue_jobs_by_status", "status" => "retrying").set(snapshot.retrying as f64);
    metrics::gauge!("queue_jobs_by_status", "status" => "cancelled").set(snapshot.cancelled as f64);

    schedule_due_retries(&pool, &jobs).await;

    match queue_queries::fetch_rate_limits(&pool).await {
        Ok(limits) => {
            for limit in &limits {
                metrics::gauge!(
                    "rate_limit_quota_percent",
                    "api_service" => limit.api_service.clone()
                )
                .set(limit.quota_percentage);
            }
            if let Some(notifier) = &notifier {
                match notifier.lock().await.check_and_notify(&limits).await {
                    Ok(0) => {}
                    Ok(sent) => {
                        metrics::counter!("rate_limit_alerts_total").increment(sent as u64);
                        tracing::info!(sent, "Dispatched rate limit alerts");
                    }
                    Err(e) => tracing::error!(error = %e, "Alert dispatch failed"),
                }
            }
        }
        Err(e) => tracing::error!(error = %e, "Sweep could not fetch rate limits"),
    }

    let elapsed = started.elapsed();
    metrics::histogram!("queue_sweep_seconds").record(elapsed.as_secs_f64());
    tracing::debug!(
        jobs = jobs.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Sweep complete"
    );
}

/// Annotate failed jobs that have no retry time yet with one computed
/// from their kind's policy. Jobs whose policy or error rules them out
/// are left alone.
async fn schedule_due_retries(pool: &PgPool, jobs: &[QueueJob]) {
    // Each kind's policy is loaded at most once per sweep.
    let mut policies: HashMap<JobKind, RetryConfig> = HashMap::new();

    for job in jobs {
        if job.status != JobStatus::Failed || job.next_retry_at.is_some() {
            continue;
        }

        let kind = job.kind();
        if !policies.contains_key(&kind) {
            let policy = match queue_queries::load_retry_config(pool, kind.as_str()).await {
                Ok(stored) => stored.unwrap_or_default(),
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Could not load retry policy, using defaults");
                    RetryConfig::default()
                }
            };
            policies.insert(kind, policy);
        }
        let Some(policy) = policies.get(&kind) else {
            continue;
        };

        if !retry::is_retry_eligible(job, policy) {
            continue;
        }
        let Some(delay) = retry::schedule_from(policy, job.retry_count + 1) else {
            continue;
        };
        let Some(at) = Utc::now().checked_add_signed(delay) else {
            continue;
        };

        let job_id = match Uuid::parse_str(&job.id) {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!(job_id = %job.id, "Unparseable job id, skipping retry annotation");
                continue;
            }
        };

        match queue_queries::schedule_retry(pool, job_id, at).await {
            Ok(true) => {
                metrics::counter!("queue_retries_scheduled_total", "kind" => kind.as_str())
                    .increment(1);
                tracing::info!(
                    job_id = %job.id,
                    kind = %kind,
                    attempt = job.retry_count + 1,
                    next_retry_at = %at,
                    "Scheduled retry"
                );
            }
            // Someone else settled or annotated the row since the snapshot.
            Ok(false) => {}
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "Could not schedule retry");
            }
        }
    }
}
