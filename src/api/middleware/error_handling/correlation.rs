use axum::http::HeaderMap;

use crate::application::ports::{ResponseSink, SinkError};
use crate::domain::CorrelationId;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Inbound headers checked for an id, highest priority first
const INBOUND_HEADERS: [&str; 3] = [CORRELATION_ID_HEADER, REQUEST_ID_HEADER, TRACE_ID_HEADER];

/// Resolves the correlation id of a request and echoes it on the response
pub struct CorrelationTracker;

impl CorrelationTracker {
    /// First non-blank id among the inbound headers
    pub fn extract(headers: &HeaderMap) -> Option<CorrelationId> {
        INBOUND_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(CorrelationId::new)
        })
    }

    /// Extract or generate the id, then write it to both response headers
    pub fn resolve(
        headers: &HeaderMap,
        sink: &mut dyn ResponseSink,
    ) -> Result<CorrelationId, SinkError> {
        let correlation_id = Self::extract(headers).unwrap_or_else(CorrelationId::generate);
        sink.set_header(CORRELATION_ID_HEADER, correlation_id.as_str())?;
        sink.set_header(REQUEST_ID_HEADER, correlation_id.as_str())?;
        Ok(correlation_id)
    }
}
