pub mod observability;

pub use observability::{ErrorCount, InMemoryErrorMetrics, InMemoryRateLimitTracker, RateTrackingConfig};
