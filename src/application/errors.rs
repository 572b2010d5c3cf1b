//! Errors raised inside the error normalization pipeline itself

use std::time::Duration;

use thiserror::Error;

use crate::application::ports::SinkError;

/// Failure while turning an exception into a response
///
/// Never leaves the exception filter: any `FilterError` triggers the
/// fallback response instead.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Failed to serialize error response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Response sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Response write timed out after {0:?}")]
    WriteTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_error_from_sink_error() {
        let err: FilterError = SinkError::AlreadySent.into();
        assert!(matches!(err, FilterError::Sink(SinkError::AlreadySent)));
        assert!(err.to_string().contains("Response already sent"));
    }

    #[test]
    fn test_filter_error_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FilterError = serde_err.into();
        assert!(matches!(err, FilterError::Serialization(_)));
        assert!(err.to_string().starts_with("Failed to serialize"));
    }

    #[test]
    fn test_write_timeout_message() {
        let err = FilterError::WriteTimeout(Duration::from_millis(5000));
        assert_eq!(err.to_string(), "Response write timed out after 5s");
    }
}
