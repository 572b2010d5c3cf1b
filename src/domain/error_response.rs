use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::value_objects::CorrelationId;

pub const FALLBACK_ERROR: &str = "Internal Server Error";
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// The JSON body returned for every failed request
///
/// `statusCode`, `error`, `message`, `path`, `timestamp` and `requestId` are
/// always present. `stack`, `details`, `method` and `userAgent` only appear in
/// development mode; `errors` and `fieldErrors` only for validation failures
/// and multi-message bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[schema(example = 400)]
    pub status_code: u16,
    #[schema(example = "Bad Request")]
    pub error: String,
    #[schema(example = "email must be a valid email")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, BTreeMap<String, String>>>,
    #[schema(example = "/v1/users")]
    pub path: String,
    #[schema(example = "2024-01-01T00:00:00.000Z")]
    pub timestamp: String,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ErrorResponse {
    /// Response with the required fields set and a current timestamp
    pub fn new(
        status_code: u16,
        error: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
        request_id: &CorrelationId,
    ) -> Self {
        Self {
            status_code,
            error: error.into(),
            message: message.into(),
            errors: None,
            field_errors: None,
            path: path.into(),
            timestamp: timestamp_now(),
            request_id: request_id.to_string(),
            stack: None,
            details: None,
            method: None,
            user_agent: None,
        }
    }

    /// Minimal 500 body sent when the normalization pipeline itself fails
    pub fn fallback(path: impl Into<String>) -> Self {
        Self::new(
            500,
            FALLBACK_ERROR,
            FALLBACK_MESSAGE,
            path,
            &CorrelationId::generate(),
        )
    }
}

/// Current UTC time as RFC 3339 with millisecond precision
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
