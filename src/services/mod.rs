pub mod alerts;
pub mod classify;
pub mod filter;
pub mod log_export;
pub mod refresh;
pub mod retry;
pub mod stats;
pub mod timefmt;
