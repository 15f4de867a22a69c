pub mod advisor;
pub mod aggregation;
pub mod calendar;
pub mod classifier;
pub mod commands;
pub mod oracle;
pub mod prompts;
pub mod replies;
pub mod router;
