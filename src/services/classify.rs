//! Classification and labeling of raw queue records into closed display
//! categories: severity bands for rate limits, color/badge tones for
//! statuses, provider folding, and cosmetic label cleanup.
//!
//! Everything here is deterministic and side-effect free. Unrecognized
//! inputs map to a designated default instead of failing.

use crate::models::job::{JobStatus, LogLevel, Provider};
use crate::models::rate_limit::Severity;

/// Display length cap for prompts carried in job payloads.
pub const PROMPT_DISPLAY_LEN: usize = 100;

/// Display length cap for raw model names with no known simplification.
const MODEL_DISPLAY_LEN: usize = 30;

// ── Rate-limit severity ──────────────────────────────────────────────

/// Buckets quota consumption. Bands are inclusive on their lower bound:
/// below 50 is safe, 50 to 80 warning, 80 to 95 danger, 95 and above
/// critical.
pub fn rate_limit_severity(percentage: f64) -> Severity {
    if percentage >= 95.0 {
        return Severity::Critical;
    }
    if percentage >= 80.0 {
        return Severity::Danger;
    }
    if percentage >= 50.0 {
        return Severity::Warning;
    }
    Severity::Safe
}

/// Color tone for a quota gauge, matching the severity bands.
pub fn rate_limit_color(percentage: f64) -> &'static str {
    match rate_limit_severity(percentage) {
        Severity::Critical => "red",
        Severity::Danger => "orange",
        Severity::Warning => "yellow",
        Severity::Safe => "green",
    }
}

// ── Status and log-level tones ───────────────────────────────────────

pub fn status_color(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "yellow",
        JobStatus::Processing => "blue",
        JobStatus::Completed => "green",
        JobStatus::Failed => "red",
        JobStatus::Retrying => "orange",
        JobStatus::Cancelled => "gray",
    }
}

pub fn status_badge(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Completed => "default",
        JobStatus::Processing | JobStatus::Pending => "secondary",
        JobStatus::Failed => "destructive",
        _ => "outline",
    }
}

pub fn log_level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "blue",
        LogLevel::Debug => "gray",
        LogLevel::Warn => "yellow",
        LogLevel::Error => "red",
    }
}

// ── Provider folding ─────────────────────────────────────────────────

/// Folds a raw provider string from the pipeline into the closed
/// [`Provider`] set by case-insensitive keyword search.
///
/// The keyword order is load-bearing: inputs matching several keywords
/// resolve to the first hit, so reordering changes outcomes. Absent or
/// unmatched input falls back to the local renderer.
pub fn map_raw_provider(raw: Option<&str>) -> Provider {
    let Some(raw) = raw else {
        return Provider::Ffmpeg;
    };
    let normalized = raw.to_lowercase();

    if normalized.contains("runware") {
        return Provider::Runware;
    }
    if normalized.contains("gemini") {
        return Provider::Gemini;
    }
    // Pollinations serves Gemini models.
    if normalized.contains("pollinations") {
        return Provider::Gemini;
    }
    if normalized.contains("gpt") || normalized.contains("openai") || normalized.contains("dall") {
        return Provider::Gpt;
    }
    if normalized.contains("eleven") {
        return Provider::ElevenLabs;
    }
    if normalized.contains("google") || normalized.contains("tts") {
        return Provider::GoogleTts;
    }

    Provider::Ffmpeg
}

/// Long-form display label for a raw integration identifier. Identifiers
/// outside the table pass through unchanged.
pub fn api_provider_label(raw: &str) -> String {
    match raw {
        "youtube" => "YouTube Data API".to_string(),
        "youtube_analytics" => "YouTube Analytics API".to_string(),
        "openai" => "OpenAI API".to_string(),
        "elevenlabs" => "ElevenLabs API".to_string(),
        "replicate" => "Replicate API".to_string(),
        "aws_s3" => "AWS S3".to_string(),
        "custom" => "Custom API".to_string(),
        other => other.to_string(),
    }
}

/// Title-cases a machine identifier: "image_generation" becomes
/// "Image Generation".
pub fn job_type_label(raw: &str) -> String {
    raw.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Model and prompt cleanup ─────────────────────────────────────────

/// Shortens a raw model identifier for display. Known families get a
/// fixed label; anything else is capped at 30 characters.
pub fn simplify_model(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown".to_string();
    };

    // "rundiffusion:130@100" renders as "Rundiffusion 130".
    if raw.contains("rundiffusion") {
        let version: String = raw
            .split_once("rundiffusion:")
            .map(|(_, rest)| rest.chars().take_while(char::is_ascii_digit).collect())
            .unwrap_or_default();
        if version.is_empty() {
            return "Rundiffusion".to_string();
        }
        return format!("Rundiffusion {}", version);
    }

    if raw.contains("dall-e") {
        return "DALL-E 3".to_string();
    }
    if raw.contains("imagen") {
        return "Imagen 2".to_string();
    }
    if raw.contains("eleven") {
        return "ElevenLabs TTS".to_string();
    }
    if raw.contains("ffmpeg") {
        return "FFMPEG".to_string();
    }

    if raw.chars().count() > MODEL_DISPLAY_LEN {
        let head: String = raw.chars().take(MODEL_DISPLAY_LEN).collect();
        return format!("{}...", head);
    }
    raw.to_string()
}

/// Caps a prompt at `max_len` characters with an ellipsis. Absent prompts
/// stay absent.
pub fn truncate_prompt(raw: Option<&str>, max_len: usize) -> Option<String> {
    let raw = raw?;
    if raw.chars().count() <= max_len {
        return Some(raw.to_string());
    }
    let head: String = raw.chars().take(max_len).collect();
    Some(format!("{}...", head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_band_boundaries() {
        assert_eq!(rate_limit_severity(0.0), Severity::Safe);
        assert_eq!(rate_limit_severity(49.9), Severity::Safe);
        assert_eq!(rate_limit_severity(50.0), Severity::Warning);
        assert_eq!(rate_limit_severity(79.9), Severity::Warning);
        assert_eq!(rate_limit_severity(80.0), Severity::Danger);
        assert_eq!(rate_limit_severity(94.9), Severity::Danger);
        assert_eq!(rate_limit_severity(95.0), Severity::Critical);
        assert_eq!(rate_limit_severity(100.0), Severity::Critical);
    }

    #[test]
    fn test_over_quota_is_critical() {
        assert_eq!(rate_limit_severity(120.0), Severity::Critical);
    }

    #[test]
    fn test_status_tones() {
        assert_eq!(status_color(JobStatus::Pending), "yellow");
        assert_eq!(status_color(JobStatus::Retrying), "orange");
        assert_eq!(status_badge(JobStatus::Completed), "default");
        assert_eq!(status_badge(JobStatus::Pending), "secondary");
        assert_eq!(status_badge(JobStatus::Failed), "destructive");
        assert_eq!(status_badge(JobStatus::Cancelled), "outline");
    }

    #[test]
    fn test_provider_keywords() {
        assert_eq!(map_raw_provider(Some("runware-sdxl")), Provider::Runware);
        assert_eq!(map_raw_provider(Some("Gemini Flash")), Provider::Gemini);
        assert_eq!(map_raw_provider(Some("pollinations.ai")), Provider::Gemini);
        assert_eq!(map_raw_provider(Some("gpt-4o")), Provider::Gpt);
        assert_eq!(map_raw_provider(Some("openai/dall-e-3")), Provider::Gpt);
        assert_eq!(map_raw_provider(Some("elevenlabs-v2")), Provider::ElevenLabs);
        assert_eq!(map_raw_provider(Some("google-tts")), Provider::GoogleTts);
        assert_eq!(map_raw_provider(Some("local-render")), Provider::Ffmpeg);
        assert_eq!(map_raw_provider(None), Provider::Ffmpeg);
    }

    #[test]
    fn test_provider_keyword_priority() {
        // Multi-keyword inputs resolve to the earliest keyword in the
        // table, not the longest or last match.
        assert_eq!(
            map_raw_provider(Some("google-eleven-bridge")),
            Provider::ElevenLabs
        );
        assert_eq!(map_raw_provider(Some("gemini-tts")), Provider::Gemini);
        assert_eq!(map_raw_provider(Some("runware-gpt-proxy")), Provider::Runware);
        assert_eq!(map_raw_provider(Some("openai-tts")), Provider::Gpt);
    }

    #[test]
    fn test_api_provider_labels() {
        assert_eq!(api_provider_label("youtube"), "YouTube Data API");
        assert_eq!(api_provider_label("youtube_analytics"), "YouTube Analytics API");
        assert_eq!(api_provider_label("aws_s3"), "AWS S3");
        assert_eq!(api_provider_label("weird_vendor"), "weird_vendor");
    }

    #[test]
    fn test_job_type_label() {
        assert_eq!(job_type_label("image"), "Image");
        assert_eq!(job_type_label("image_generation"), "Image Generation");
        assert_eq!(job_type_label("tts_audio_render"), "Tts Audio Render");
    }

    #[test]
    fn test_simplify_model() {
        assert_eq!(simplify_model(Some("rundiffusion:130@100")), "Rundiffusion 130");
        assert_eq!(simplify_model(Some("rundiffusion-legacy")), "Rundiffusion");
        assert_eq!(simplify_model(Some("dall-e-3")), "DALL-E 3");
        assert_eq!(simplify_model(Some("imagen-2-fast")), "Imagen 2");
        assert_eq!(simplify_model(Some("eleven_turbo_v2")), "ElevenLabs TTS");
        assert_eq!(simplify_model(Some("ffmpeg-pipeline")), "FFMPEG");
        assert_eq!(simplify_model(Some("SD XL 1.0")), "SD XL 1.0");
        assert_eq!(simplify_model(None), "Unknown");

        let long = "a-model-name-well-over-thirty-characters-long";
        let simplified = simplify_model(Some(long));
        assert!(simplified.ends_with("..."));
        assert_eq!(simplified.chars().count(), 33);
    }

    #[test]
    fn test_truncate_prompt() {
        assert_eq!(truncate_prompt(None, 100), None);
        assert_eq!(
            truncate_prompt(Some("short prompt"), 100),
            Some("short prompt".to_string())
        );
        let long = "x".repeat(150);
        let truncated = truncate_prompt(Some(&long), 100).unwrap();
        assert_eq!(truncated.chars().count(), 103);
        assert!(truncated.ends_with("..."));
    }
}
