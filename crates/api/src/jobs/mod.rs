//! Background jobs and their scheduler.

mod expiry_digest;
mod pool_metrics;
mod scheduler;

pub use expiry_digest::ExpiryDigestJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
