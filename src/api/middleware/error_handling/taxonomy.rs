use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

use super::config::FilterOptions;
use crate::domain::error_response::{FALLBACK_ERROR, FALLBACK_MESSAGE};
use crate::domain::error_types::canonical_error_name;
use crate::domain::Exception;

/// Message used for named errors that carry an empty message
pub const EMPTY_NAMED_MESSAGE: &str = "Internal server error";

/// Status and raw body decided for one exception
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: StatusCode,
    pub body: Value,
}

/// Maps exceptions to a status code and raw error body
#[derive(Debug, Clone)]
pub struct ErrorTaxonomyMapper {
    options: Arc<FilterOptions>,
}

impl ErrorTaxonomyMapper {
    pub fn new(options: Arc<FilterOptions>) -> Self {
        Self { options }
    }

    pub fn classify(&self, exception: &Exception) -> Classification {
        let status = exception.status();
        let body = match exception {
            Exception::Http(http) => http.response().clone(),
            // The payload builder renders validation failures from the items
            Exception::Validation(validation) => json!({
                "error": self.error_name(status),
                "message": validation.messages(),
            }),
            Exception::Named(named) => {
                let message = if named.message.is_empty() {
                    EMPTY_NAMED_MESSAGE
                } else {
                    named.message.as_str()
                };
                json!({
                    "error": self.error_name(status),
                    "message": message,
                })
            }
            Exception::Unknown(thrown) => json!({
                "error": self.custom_message(status).unwrap_or(FALLBACK_ERROR),
                "message": FALLBACK_MESSAGE,
                "details": thrown.value(),
            }),
        };

        Classification { status, body }
    }

    /// Configured error text for `status`, else its canonical name
    pub fn error_name(&self, status: StatusCode) -> String {
        self.custom_message(status)
            .unwrap_or_else(|| canonical_error_name(status))
            .to_string()
    }

    fn custom_message(&self, status: StatusCode) -> Option<&str> {
        self.options
            .custom_error_messages
            .get(&status.as_u16())
            .map(String::as_str)
    }
}
