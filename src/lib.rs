//! API Queue Monitor
//!
//! This library provides the core functionality for the api-queue-monitor
//! service, which watches a content pipeline's external API job queue:
//! snapshot fetching and filtering, retry-policy evaluation, rate-limit
//! severity tracking, and the periodic refresh scheduler behind the
//! watcher process.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
