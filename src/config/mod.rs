use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for the watcher process.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// How many of the newest jobs each snapshot fetch pulls
    #[serde(default = "default_job_fetch_limit")]
    pub job_fetch_limit: i64,

    /// Seconds between watcher sweeps
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Optional cap on a single sweep's runtime, in seconds
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,

    /// Ops webhook for rate-limit escalation alerts. Alerts are disabled
    /// when unset.
    #[serde(default)]
    pub alert_webhook_url: Option<String>,

    /// Prometheus scrape address for the watcher process
    #[serde(default = "default_watcher_metrics_addr")]
    pub watcher_metrics_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_job_fetch_limit() -> i64 {
    500
}

fn default_watch_interval_secs() -> u64 {
    120
}

fn default_watcher_metrics_addr() -> String {
    "0.0.0.0:9091".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
