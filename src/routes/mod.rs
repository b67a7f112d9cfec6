pub mod actions;
pub mod health;
pub mod logs;
pub mod metrics;
pub mod queue;
