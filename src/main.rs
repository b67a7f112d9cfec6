mod app_state;
mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::{routing::delete, routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing api-queue-monitor server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!(
        "queue_actions_total",
        "Queue job actions taken through the API, by action"
    );
    metrics::describe_counter!(
        "queue_retry_config_saves_total",
        "Retry policy updates saved through the API, by job kind"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Create shared application state
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db_pool, config);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/queue/jobs", get(routes::queue::list_jobs))
        .route("/api/v1/queue/jobs/{id}", get(routes::queue::get_job))
        .route(
            "/api/v1/queue/jobs/{id}/logs",
            get(routes::logs::get_job_logs),
        )
        .route(
            "/api/v1/queue/jobs/{id}/retry",
            post(routes::actions::retry_job),
        )
        .route(
            "/api/v1/queue/jobs/{id}/cancel",
            post(routes::actions::cancel_job),
        )
        .route(
            "/api/v1/queue/jobs/{id}/pause",
            post(routes::actions::pause_job),
        )
        .route(
            "/api/v1/queue/failed",
            delete(routes::actions::clear_failed_jobs),
        )
        .route("/api/v1/queue/stats", get(routes::queue::get_stats))
        .route(
            "/api/v1/queue/rate-limits",
            get(routes::queue::list_rate_limits),
        )
        .route(
            "/api/v1/queue/retry-config/{job_kind}",
            get(routes::queue::get_retry_config).put(routes::queue::update_retry_config),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1 MB limit

    tracing::info!("Starting api-queue-monitor on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
