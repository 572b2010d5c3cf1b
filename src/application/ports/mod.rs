mod error_metrics;
mod rate_limit_tracker;
mod request_info;
mod response_sink;

pub use error_metrics::ErrorMetrics;
pub use rate_limit_tracker::RateLimitTracker;
pub use request_info::{RequestInfo, UNMATCHED_ROUTE};
pub use response_sink::{ResponseSink, SinkError};

#[cfg(test)]
pub use error_metrics::MockErrorMetrics;
#[cfg(test)]
pub use rate_limit_tracker::MockRateLimitTracker;
