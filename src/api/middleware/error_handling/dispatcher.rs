use std::time::Duration;

use axum::http::StatusCode;
use tracing::{error, warn};

use crate::application::errors::FilterError;
use crate::application::ports::{RequestInfo, ResponseSink};
use crate::domain::{CorrelationId, ErrorResponse, Exception};

pub const POWERED_BY_HEADER: &str = "x-powered-by";

/// Headers set on every error response
pub const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("cache-control", "no-cache, no-store, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Request-scoped data carried into the error log entry
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub correlation_id: &'a CorrelationId,
    pub request: &'a RequestInfo,
    pub client_ip: &'a str,
    pub exception: &'a Exception,
}

/// Writes an error payload to the response sink
#[derive(Debug, Clone)]
pub struct ResponseDispatcher {
    write_timeout: Duration,
}

impl ResponseDispatcher {
    pub fn new(write_timeout: Duration) -> Self {
        Self { write_timeout }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Apply security headers, log, then write under the timeout guard
    ///
    /// Write failures and timeouts are logged and end the response; only
    /// failures before the write is attempted are returned.
    pub async fn dispatch(
        &self,
        sink: &mut dyn ResponseSink,
        status: StatusCode,
        payload: &ErrorResponse,
        context: &DispatchContext<'_>,
    ) -> Result<(), FilterError> {
        if sink.headers_sent() {
            warn!(
                request_id = %context.correlation_id,
                status = status.as_u16(),
                url = %context.request.url,
                "response_already_sent"
            );
            return Ok(());
        }

        apply_security_headers(sink)?;
        log_exception(status, payload, context);

        let body = serde_json::to_value(payload)?;
        sink.set_status(status);

        let outcome = tokio::time::timeout(self.write_timeout, sink.send_json(&body)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    request_id = %context.correlation_id,
                    error = %err,
                    "error_response_write_failed"
                );
                sink.end(None);
            }
            Err(_) => {
                error!(
                    request_id = %context.correlation_id,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "error_response_write_timed_out"
                );
                if !sink.headers_sent() {
                    sink.end(None);
                }
            }
        }

        Ok(())
    }
}

pub fn apply_security_headers(sink: &mut dyn ResponseSink) -> Result<(), FilterError> {
    sink.remove_header(POWERED_BY_HEADER);
    for (name, value) in SECURITY_HEADERS {
        sink.set_header(name, value)?;
    }
    Ok(())
}

fn log_exception(status: StatusCode, payload: &ErrorResponse, context: &DispatchContext<'_>) {
    let request = context.request;
    let user_agent = request.user_agent().unwrap_or("-");
    let stack = context.exception.stack().unwrap_or("");

    if context.exception.is_http() && !status.is_server_error() {
        warn!(
            request_id = %context.correlation_id,
            status = status.as_u16(),
            method = %request.method,
            url = %request.url,
            client_ip = %context.client_ip,
            user_agent = %user_agent,
            timestamp = %payload.timestamp,
            message = %payload.message,
            "http_exception"
        );
    } else if context.exception.is_http() {
        error!(
            request_id = %context.correlation_id,
            status = status.as_u16(),
            method = %request.method,
            url = %request.url,
            client_ip = %context.client_ip,
            user_agent = %user_agent,
            timestamp = %payload.timestamp,
            message = %payload.message,
            stack = %stack,
            "http_exception"
        );
    } else {
        error!(
            request_id = %context.correlation_id,
            status = status.as_u16(),
            method = %request.method,
            url = %request.url,
            client_ip = %context.client_ip,
            user_agent = %user_agent,
            timestamp = %payload.timestamp,
            exception = %context.exception,
            stack = %stack,
            "unhandled_exception"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::error_handling::BufferedResponse;
    use crate::domain::HttpException;
    use axum::http::Method;

    fn payload(correlation_id: &CorrelationId) -> ErrorResponse {
        ErrorResponse::new(404, "Not Found", "missing", "/things/1", correlation_id)
    }

    #[tokio::test]
    async fn test_dispatch_sets_headers_and_body() {
        let correlation_id = CorrelationId::new("abc");
        let request = RequestInfo::new(Method::GET, "/things/1");
        let exception: Exception = HttpException::not_found("missing").into();
        let context = DispatchContext {
            correlation_id: &correlation_id,
            request: &request,
            client_ip: "unknown",
            exception: &exception,
        };

        let mut sink = BufferedResponse::new();
        sink.set_header("x-powered-by", "Express").unwrap();

        ResponseDispatcher::new(Duration::from_secs(1))
            .dispatch(&mut sink, StatusCode::NOT_FOUND, &payload(&correlation_id), &context)
            .await
            .unwrap();

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let headers = response.headers();
        assert!(headers.get("x-powered-by").is_none());
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
        assert_eq!(headers["pragma"], "no-cache");
        assert_eq!(headers["expires"], "0");
        assert_eq!(headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_dispatch_skips_sent_response() {
        let correlation_id = CorrelationId::new("abc");
        let request = RequestInfo::new(Method::GET, "/");
        let exception = Exception::unknown("late");
        let context = DispatchContext {
            correlation_id: &correlation_id,
            request: &request,
            client_ip: "unknown",
            exception: &exception,
        };

        let mut sink = BufferedResponse::new();
        sink.set_status(StatusCode::OK);
        sink.end(Some("done"));

        ResponseDispatcher::new(Duration::from_secs(1))
            .dispatch(&mut sink, StatusCode::INTERNAL_SERVER_ERROR, &payload(&correlation_id), &context)
            .await
            .unwrap();

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-frame-options").is_none());
    }
}
