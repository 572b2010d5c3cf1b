use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Response already sent")]
    AlreadySent,

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to write response: {0}")]
    Write(String),
}

/// Port for the outbound side of one HTTP exchange
///
/// Mirrors a response object that can be mutated until it is sent: once
/// `headers_sent` is true, no further status or header changes apply.
#[async_trait]
pub trait ResponseSink: Send {
    fn headers_sent(&self) -> bool;

    fn set_status(&mut self, status: StatusCode);

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), SinkError>;

    fn remove_header(&mut self, name: &str);

    /// Serialize `body` as the response and mark it sent
    async fn send_json(&mut self, body: &Value) -> Result<(), SinkError>;

    /// Terminate the response, optionally with a plain-text body
    fn end(&mut self, text: Option<&str>);
}
