use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use super::config::FilterOptions;
use super::sanitizers::ErrorSanitizer;
use super::taxonomy::ErrorTaxonomyMapper;
use crate::application::ports::RequestInfo;
use crate::domain::{CorrelationId, ErrorResponse, Exception, ValidationException};

/// `error` text of every validation failure
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Message used when an error body carries nothing usable
pub const DEFAULT_MESSAGE: &str = "An error occurred";

/// Assembles the [`ErrorResponse`] for a classified exception
#[derive(Debug, Clone)]
pub struct ErrorPayloadBuilder {
    options: Arc<FilterOptions>,
    taxonomy: ErrorTaxonomyMapper,
    sanitizer: ErrorSanitizer,
}

impl ErrorPayloadBuilder {
    pub fn new(options: Arc<FilterOptions>) -> Self {
        Self {
            taxonomy: ErrorTaxonomyMapper::new(Arc::clone(&options)),
            sanitizer: ErrorSanitizer::new(&options),
            options,
        }
    }

    pub fn build(
        &self,
        status: StatusCode,
        raw_body: &Value,
        request: &RequestInfo,
        correlation_id: &CorrelationId,
        exception: &Exception,
    ) -> ErrorResponse {
        let mut payload = match exception {
            Exception::Validation(validation) => {
                self.validation_payload(status, validation, request, correlation_id)
            }
            _ => self.generic_payload(status, raw_body, request, correlation_id),
        };

        if self.options.is_development {
            payload.stack = exception.stack().map(str::to_string);
            payload.details = raw_body
                .get("details")
                .filter(|details| !details.is_null())
                .cloned();
            payload.method = Some(request.method.to_string());
            payload.user_agent = request.user_agent().map(str::to_string);
        }

        self.sanitize(payload)
    }

    fn validation_payload(
        &self,
        status: StatusCode,
        validation: &ValidationException,
        request: &RequestInfo,
        correlation_id: &CorrelationId,
    ) -> ErrorResponse {
        let message = validation.first_message().unwrap_or(VALIDATION_FAILED);
        let mut payload = ErrorResponse::new(
            status.as_u16(),
            VALIDATION_FAILED,
            message,
            request.url.as_str(),
            correlation_id,
        );
        payload.errors = Some(validation.messages());
        payload.field_errors = Some(validation.field_errors());
        payload
    }

    fn generic_payload(
        &self,
        status: StatusCode,
        raw_body: &Value,
        request: &RequestInfo,
        correlation_id: &CorrelationId,
    ) -> ErrorResponse {
        let (error, message, errors) = match raw_body {
            Value::String(text) => (text.clone(), text.clone(), None),
            Value::Object(body) => {
                let (message, errors) = resolve_message(body.get("message"));
                let error = body
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.taxonomy.error_name(status));
                (error, message, errors)
            }
            other => (self.taxonomy.error_name(status), coerce(Some(other)), None),
        };

        let mut payload = ErrorResponse::new(
            status.as_u16(),
            error,
            message,
            request.url.as_str(),
            correlation_id,
        );
        payload.errors = errors;
        payload
    }

    fn sanitize(&self, mut payload: ErrorResponse) -> ErrorResponse {
        if !self.sanitizer.is_active() {
            return payload;
        }

        let (message, stack) = self
            .sanitizer
            .sanitize_pair(&payload.message, payload.stack.as_deref());
        payload.message = message;
        payload.stack = stack;
        payload.error = self.sanitizer.sanitize(&payload.error);
        payload.errors = payload
            .errors
            .map(|errors| self.sanitizer.sanitize_all(errors));
        payload.field_errors = payload
            .field_errors
            .map(|field_errors| self.sanitizer.sanitize_field_errors(field_errors));
        payload
    }
}

/// Split a body's `message` into the headline and any further messages
fn resolve_message(message: Option<&Value>) -> (String, Option<Vec<String>>) {
    match message {
        Some(Value::Array(items)) => {
            let mut texts = items.iter().map(|item| coerce(Some(item)));
            let first = texts.next().unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
            let rest: Vec<String> = texts.collect();
            (first, (!rest.is_empty()).then_some(rest))
        }
        other => (coerce(other), None),
    }
}

fn coerce(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    if text.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HttpException, NamedError, ValidationErrorItem};
    use axum::http::Method;
    use serde_json::json;

    fn request() -> RequestInfo {
        RequestInfo::new(Method::POST, "/v1/users?dry_run=true")
            .with_header("user-agent", "integration-test/1.0")
    }

    fn build(options: FilterOptions, exception: Exception) -> ErrorResponse {
        let options = Arc::new(options);
        let classification = ErrorTaxonomyMapper::new(Arc::clone(&options)).classify(&exception);
        ErrorPayloadBuilder::new(options).build(
            classification.status,
            &classification.body,
            &request(),
            &CorrelationId::new("corr-1"),
            &exception,
        )
    }

    fn two_field_validation() -> Exception {
        ValidationException::new(vec![
            ValidationErrorItem::new("name").with_constraint("isNotEmpty", "name is required"),
            ValidationErrorItem::new("email")
                .with_constraint("isEmail", "email must be a valid email"),
        ])
        .into()
    }

    #[test]
    fn test_required_fields_always_set() {
        let payload = build(FilterOptions::production(), NamedError::new("Error", "x").into());
        assert_eq!(payload.status_code, 500);
        assert_eq!(payload.path, "/v1/users?dry_run=true");
        assert_eq!(payload.request_id, "corr-1");
        assert!(!payload.timestamp.is_empty());
        assert!(payload.stack.is_none());
        assert!(payload.method.is_none());
        assert!(payload.user_agent.is_none());
        assert!(payload.errors.is_none());
        assert!(payload.field_errors.is_none());
    }

    #[test]
    fn test_validation_branch() {
        let payload = build(FilterOptions::production(), two_field_validation());
        assert_eq!(payload.status_code, 400);
        assert_eq!(payload.error, "Validation failed");
        assert_eq!(payload.message, "name is required");
        assert_eq!(payload.errors.as_ref().map(Vec::len), Some(2));

        let field_errors = payload.field_errors.unwrap();
        let keys: Vec<_> = field_errors.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["email", "name"]);
    }

    #[test]
    fn test_validation_without_messages() {
        let payload = build(
            FilterOptions::production(),
            ValidationException::new(vec![]).into(),
        );
        assert_eq!(payload.message, "Validation failed");
        assert_eq!(payload.errors, Some(vec![]));
    }

    #[test]
    fn test_validation_messages_are_sanitized_in_production() {
        let exception: Exception = ValidationException::new(vec![ValidationErrorItem::new(
            "password",
        )
        .with_constraint("matches", "password: hunter2 is too weak")])
        .into();

        let payload = build(FilterOptions::production(), exception);
        assert_eq!(payload.message, "[REDACTED] is too weak");
        assert_eq!(payload.errors.unwrap(), vec!["[REDACTED] is too weak"]);
        assert_eq!(
            payload.field_errors.unwrap()["password"]["matches"],
            "[REDACTED] is too weak"
        );
    }

    #[test]
    fn test_string_body_is_error_and_message() {
        let payload = build(
            FilterOptions::production(),
            HttpException::new(StatusCode::TOO_MANY_REQUESTS, "Test error").into(),
        );
        assert_eq!(payload.status_code, 429);
        assert_eq!(payload.error, "Test error");
        assert_eq!(payload.message, "Test error");
        assert!(payload.errors.is_none());
    }

    #[test]
    fn test_array_message_splits_into_errors() {
        let exception = HttpException::bad_request(json!(["first", "second", "third"]));
        let payload = build(FilterOptions::production(), exception.into());
        assert_eq!(payload.message, "first");
        assert_eq!(
            payload.errors,
            Some(vec!["second".to_string(), "third".to_string()])
        );
        assert_eq!(payload.error, "Bad Request");
    }

    #[test]
    fn test_single_element_array_has_no_errors() {
        let exception = HttpException::bad_request(json!(["only"]));
        let payload = build(FilterOptions::production(), exception.into());
        assert_eq!(payload.message, "only");
        assert!(payload.errors.is_none());
    }

    #[test]
    fn test_non_string_message_is_coerced() {
        let numeric = HttpException::with_body(StatusCode::CONFLICT, json!({"message": 42}));
        let payload = build(FilterOptions::production(), numeric.into());
        assert_eq!(payload.message, "42");
        assert_eq!(payload.error, "Conflict");

        let missing = HttpException::with_body(StatusCode::CONFLICT, json!({}));
        let payload = build(FilterOptions::production(), missing.into());
        assert_eq!(payload.message, "An error occurred");
    }

    #[test]
    fn test_missing_error_uses_custom_message() {
        let options = FilterOptions::production().with_custom_error_message(409, "Already exists");
        let body = HttpException::with_body(StatusCode::CONFLICT, json!({"message": "dup"}));
        let payload = build(options, body.into());
        assert_eq!(payload.error, "Already exists");
        assert_eq!(payload.status_code, 409);
    }

    #[test]
    fn test_generic_named_error_end_to_end() {
        let payload = build(
            FilterOptions::production(),
            NamedError::new("Error", "Generic error").into(),
        );
        assert_eq!(payload.status_code, 500);
        assert_eq!(payload.error, "Internal Server Error");
        assert_eq!(payload.message, "Generic error");
    }

    #[test]
    fn test_development_adds_debug_fields() {
        let exception = HttpException::with_body(
            StatusCode::BAD_GATEWAY,
            json!({"error": "Bad Gateway", "message": "password: secret123", "details": {"upstream": "billing"}}),
        )
        .with_stack("at billing::charge");

        let payload = build(FilterOptions::development(), exception.into());
        assert_eq!(payload.message, "password: secret123");
        assert_eq!(payload.stack.as_deref(), Some("at billing::charge"));
        assert_eq!(payload.details, Some(json!({"upstream": "billing"})));
        assert_eq!(payload.method.as_deref(), Some("POST"));
        assert_eq!(payload.user_agent.as_deref(), Some("integration-test/1.0"));
    }

    #[test]
    fn test_development_unknown_throw_exposes_details() {
        let payload = build(FilterOptions::development(), Exception::unknown("kaboom"));
        assert_eq!(payload.error, "Internal Server Error");
        assert_eq!(payload.message, "An unexpected error occurred");
        assert_eq!(payload.details, Some(json!("kaboom")));
    }

    #[test]
    fn test_production_sanitizes_message_and_errors() {
        let exception = HttpException::bad_request(json!([
            "password: secret123",
            "card 4111-1111-1111-1111",
            "ssn 123-45-6789"
        ]));
        let payload = build(FilterOptions::production(), exception.into());
        assert_eq!(payload.message, "[REDACTED]");
        assert_eq!(
            payload.errors.unwrap(),
            vec!["card [REDACTED]".to_string(), "ssn [REDACTED]".to_string()]
        );
        assert!(payload.details.is_none());
    }

    #[test]
    fn test_sanitization_disabled_keeps_text() {
        let payload = build(
            FilterOptions::production().with_sanitization(false),
            NamedError::new("Error", "token=abc").into(),
        );
        assert_eq!(payload.message, "token=abc");
    }
}
