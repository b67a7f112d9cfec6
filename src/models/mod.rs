pub mod filters;
pub mod job;
pub mod rate_limit;
pub mod retry;
