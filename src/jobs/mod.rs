//! Background jobs.

pub mod retention_job;

pub use retention_job::{retention_job_handler, AuditRetentionJob, RetentionContext};
