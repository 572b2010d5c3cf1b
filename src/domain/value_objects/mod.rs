mod correlation_id;

pub use correlation_id::CorrelationId;
