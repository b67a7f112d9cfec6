//! Seed the queue tables with demo data for local development.
//!
//! Wipes and repopulates api_queue_jobs, api_rate_limits and
//! queue_retry_configs so the API and watcher have something to show.
//!
//! Usage:
//!   cargo run --example seed_demo_queue
//!
//! Prerequisites:
//!   - .env file with DATABASE_URL pointing at a running PostgreSQL

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::PgPool;

use api_queue_monitor::db;

struct SeedJob {
    job_type: &'static str,
    api_provider: &'static str,
    status: &'static str,
    priority: &'static str,
    workflow_name: Option<&'static str>,
    payload: serde_json::Value,
    /// Minutes before now the job was created.
    age_minutes: i64,
    /// Minutes after creation the job started running.
    run_minutes: Option<i64>,
    /// Minutes after creation the job finished (completed or failed).
    done_minutes: Option<i64>,
    retry_count: i32,
    progress: Option<i16>,
    progress_message: Option<&'static str>,
    error_code: Option<&'static str>,
    error_message: Option<&'static str>,
    error_type: Option<&'static str>,
    logs: serde_json::Value,
}

impl SeedJob {
    fn new(
        job_type: &'static str,
        api_provider: &'static str,
        status: &'static str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            job_type,
            api_provider,
            status,
            priority: "normal",
            workflow_name: None,
            payload,
            age_minutes: 30,
            run_minutes: None,
            done_minutes: None,
            retry_count: 0,
            progress: None,
            progress_message: None,
            error_code: None,
            error_message: None,
            error_type: None,
            logs: json!([]),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    println!("🌱 API Queue Demo Seeder\n");

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");

    println!("🔌 Connecting to PostgreSQL...");
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    println!("✅ Connected, migrations up to date\n");

    println!("🧹 Clearing existing queue data...");
    sqlx::query("TRUNCATE api_queue_jobs, api_rate_limits, queue_retry_configs")
        .execute(&pool)
        .await?;

    let jobs = demo_jobs();
    println!("⬆️  Inserting {} demo jobs...", jobs.len());
    for job in &jobs {
        insert_job(&pool, job).await?;
    }

    println!("⬆️  Inserting rate limit snapshots...");
    seed_rate_limits(&pool).await?;

    println!("⬆️  Inserting a retry policy override for audio jobs...");
    sqlx::query(
        r#"
        INSERT INTO queue_retry_configs
            (job_kind, strategy, max_attempts, retry_interval, retry_on_errors)
        VALUES ('audio', 'fixed', 5, '1min', '["429", "408", "5xx"]'::jsonb)
        "#,
    )
    .execute(&pool)
    .await?;

    println!("\n🎉 Done. Start the server and open /api/v1/queue/jobs");
    Ok(())
}

fn demo_jobs() -> Vec<SeedJob> {
    let now = Utc::now();
    let ts = |minutes_ago: i64| (now - Duration::minutes(minutes_ago)).to_rfc3339();

    vec![
        SeedJob {
            age_minutes: 2,
            run_minutes: Some(1),
            progress: Some(64),
            progress_message: Some("Rendering frames 840/1200"),
            workflow_name: Some("daily-shorts"),
            logs: json!([
                {"timestamp": ts(2), "level": "INFO", "message": "Job accepted", "metadata": {"queuePosition": 1}},
                {"timestamp": ts(1), "level": "INFO", "message": "Generation started"},
            ]),
            ..SeedJob::new(
                "image",
                "runware",
                "processing",
                json!({
                    "prompt": "A futuristic cityscape at sunset with flying cars",
                    "model": "rundiffusion:130@100",
                    "channelName": "TechFlow Tutorials",
                    "videoTitle": "How to Build a Viral YouTube Channel in 2025",
                }),
            )
        },
        SeedJob {
            age_minutes: 8,
            priority: "high",
            workflow_name: Some("daily-shorts"),
            logs: json!([
                {"timestamp": ts(8), "level": "INFO", "message": "Job accepted", "metadata": {"queuePosition": 3}},
            ]),
            ..SeedJob::new(
                "image",
                "gemini-2.0-flash",
                "pending",
                json!({
                    "prompt": "Professional headshot with modern office background",
                    "model": "imagen-3.0",
                    "channelName": "TechFlow Tutorials",
                    "videoTitle": "React 19: Complete Tutorial for Beginners",
                }),
            )
        },
        SeedJob {
            age_minutes: 95,
            run_minutes: Some(2),
            done_minutes: Some(6),
            workflow_name: Some("weekly-longform"),
            logs: json!([
                {"timestamp": ts(95), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(93), "level": "INFO", "message": "Generation started"},
                {"timestamp": ts(89), "level": "INFO", "message": "Upload complete", "metadata": {"bytes": 2_483_200}},
            ]),
            ..SeedJob::new(
                "image",
                "gpt-image",
                "completed",
                json!({
                    "prompt": "Abstract geometric pattern in vibrant colors",
                    "model": "dall-e-3",
                    "channelName": "DesignDaily",
                    "videoTitle": "The Future of AI Development",
                }),
            )
        },
        SeedJob {
            age_minutes: 40,
            run_minutes: Some(1),
            done_minutes: Some(3),
            retry_count: 1,
            error_code: Some("429"),
            error_message: Some("Rate limit exceeded, provider API returned 429"),
            error_type: Some("RateLimitError"),
            workflow_name: Some("daily-shorts"),
            logs: json!([
                {"timestamp": ts(40), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(39), "level": "INFO", "message": "Generation started"},
                {"timestamp": ts(37), "level": "ERROR", "message": "Provider rejected request", "metadata": {"status": 429}},
            ]),
            ..SeedJob::new(
                "image",
                "runware",
                "failed",
                json!({
                    "prompt": "Minimalist logo design for tech startup",
                    "model": "rundiffusion:130@100",
                    "channelName": "DesignDaily",
                    "videoTitle": "Next.js 15 App Router Deep Dive",
                }),
            )
        },
        SeedJob {
            age_minutes: 5,
            run_minutes: Some(1),
            progress: Some(31),
            workflow_name: Some("weekly-longform"),
            logs: json!([
                {"timestamp": ts(5), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(4), "level": "DEBUG", "message": "Voice model warmed"},
            ]),
            ..SeedJob::new(
                "audio",
                "elevenlabs-tts",
                "processing",
                json!({
                    "voiceModel": "Eleven Turbo v2",
                    "fileSize": "2.4 MB",
                    "channelName": "TechFlow Tutorials",
                    "videoTitle": "Supabase Full Stack Tutorial",
                }),
            )
        },
        SeedJob {
            age_minutes: 130,
            run_minutes: Some(3),
            done_minutes: Some(9),
            workflow_name: Some("weekly-longform"),
            logs: json!([
                {"timestamp": ts(130), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(121), "level": "INFO", "message": "Narration rendered"},
            ]),
            ..SeedJob::new(
                "audio",
                "google-tts",
                "completed",
                json!({
                    "voiceModel": "Neural2",
                    "fileSize": "5.1 MB",
                    "channelName": "DesignDaily",
                    "videoTitle": "The Future of AI Development",
                }),
            )
        },
        SeedJob {
            age_minutes: 12,
            run_minutes: Some(2),
            progress: Some(48),
            progress_message: Some("Encoding 1080p"),
            priority: "high",
            workflow_name: Some("daily-shorts"),
            logs: json!([
                {"timestamp": ts(12), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(10), "level": "INFO", "message": "Render pipeline started", "metadata": {"pipeline": "A"}},
            ]),
            ..SeedJob::new(
                "video",
                "ffmpeg",
                "processing",
                json!({
                    "renderPipeline": "Pipeline A",
                    "resolution": "1080p",
                    "fileSize": "148 MB",
                    "channelName": "TechFlow Tutorials",
                    "videoTitle": "How to Build a Viral YouTube Channel in 2025",
                }),
            )
        },
        SeedJob {
            age_minutes: 2 * 24 * 60,
            run_minutes: Some(5),
            done_minutes: Some(65),
            retry_count: 3,
            error_code: Some("500"),
            error_message: Some("Render pipeline crashed after 3 attempts"),
            error_type: Some("PipelineError"),
            workflow_name: Some("weekly-longform"),
            logs: json!([
                {"timestamp": ts(2 * 24 * 60), "level": "INFO", "message": "Job accepted"},
                {"timestamp": ts(2 * 24 * 60 - 65), "level": "ERROR", "message": "Encoder exited unexpectedly", "metadata": {"exitCode": 137}},
            ]),
            ..SeedJob::new(
                "video",
                "ffmpeg",
                "failed",
                json!({
                    "renderPipeline": "Pipeline B",
                    "resolution": "4K",
                    "fileSize": "1.2 GB",
                    "channelName": "DesignDaily",
                    "videoTitle": "Next.js 15 App Router Deep Dive",
                }),
            )
        },
    ]
}

async fn insert_job(pool: &PgPool, job: &SeedJob) -> Result<(), sqlx::Error> {
    let created: DateTime<Utc> = Utc::now() - Duration::minutes(job.age_minutes);
    let started = job.run_minutes.map(|m| created + Duration::minutes(m));
    let done = job.done_minutes.map(|m| created + Duration::minutes(m));
    let (processed_at, failed_at) = if job.status == "failed" {
        (None, done)
    } else {
        (done, None)
    };

    sqlx::query(
        r#"
        INSERT INTO api_queue_jobs
            (job_type, api_provider, status, priority, payload, workflow_name,
             created_at, queued_at, started_at, processed_at, failed_at,
             retry_count, max_retries, retry_strategy,
             progress, progress_message, error_code, error_message, error_type, logs)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, 3, 'exponential', $13, $14, $15, $16, $17, $18)
        "#,
    )
    .bind(job.job_type)
    .bind(job.api_provider)
    .bind(job.status)
    .bind(job.priority)
    .bind(&job.payload)
    .bind(job.workflow_name)
    .bind(created)
    .bind(created)
    .bind(started)
    .bind(processed_at)
    .bind(failed_at)
    .bind(job.retry_count)
    .bind(job.progress)
    .bind(job.progress_message)
    .bind(job.error_code)
    .bind(job.error_message)
    .bind(job.error_type)
    .bind(&job.logs)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_rate_limits(pool: &PgPool) -> Result<(), sqlx::Error> {
    let resets_at = Utc::now() + Duration::hours(6);

    let limits = [
        (
            "youtube",
            8_200_i64,
            10_000_i64,
            82.0_f64,
            "units",
            640_i64,
            Some(json!([
                {"name": "search.list", "cost": 100, "used_today": 4_200},
                {"name": "videos.insert", "cost": 1600, "used_today": 3_200},
                {"name": "channels.list", "cost": 1, "used_today": 800},
            ])),
        ),
        ("openai", 1_340, 5_000, 26.8, "requests", 95, None),
        ("elevenlabs", 410_000, 1_000_000, 41.0, "characters", 22_000, None),
        ("replicate", 96, 200, 48.0, "requests", 9, None),
    ];

    for (provider, used, limit, pct, unit, rate, operations) in limits {
        sqlx::query(
            r#"
            INSERT INTO api_rate_limits
                (api_provider, quota_used, quota_limit, quota_percentage,
                 unit, resets_at, current_rate, operations)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(provider)
        .bind(used)
        .bind(limit)
        .bind(pct)
        .bind(unit)
        .bind(resets_at)
        .bind(rate)
        .bind(operations)
        .execute(pool)
        .await?;
    }

    Ok(())
}
