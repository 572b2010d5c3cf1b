mod error_metrics;
mod rate_tracking;

pub use error_metrics::{ErrorCount, InMemoryErrorMetrics};
pub use rate_tracking::{InMemoryRateLimitTracker, RateTrackingConfig};
