//! Domain services.

pub mod alerts;
pub mod audit;
pub mod search;
pub mod threshold_cache;

pub use audit::ActivityLogBuilder;
pub use threshold_cache::{CacheInvalidation, ThresholdCache, ThresholdStore, ThresholdStoreError};
