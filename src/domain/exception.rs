//! Exception kinds understood by the exception filter
//!
//! Everything a handler can fail with is funnelled into [`Exception`], a sum
//! type decided once at the point the error is raised:
//!
//! - [`HttpException`]: carries its own status and body, passed through verbatim
//! - [`ValidationException`]: field-level validation failures
//! - [`NamedError`]: a generic error whose `name` selects the status
//! - [`UnknownThrow`]: a value that is not an error at all (panic payloads)

use std::any::Any;
use std::fmt;

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use super::error_types::{
    canonical_error_name, status_for_error_name, GENERIC_ERROR, JSON_WEB_TOKEN_ERROR,
    NOT_FOUND_ERROR, FORBIDDEN_ERROR, TIMEOUT_ERROR, TOKEN_EXPIRED_ERROR,
};
use super::validation::ValidationException;

/// Error carrying an explicit HTTP status and response body
///
/// The body is either a plain string or an object of the shape
/// `{ "error": ..., "message": ..., "details": ... }`; `message` may also be
/// an array of strings.
#[derive(Debug, Clone)]
pub struct HttpException {
    status: StatusCode,
    body: Value,
    stack: Option<String>,
}

impl HttpException {
    /// Exception whose body is the message itself
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::with_body(status, Value::String(message.into()))
    }

    pub fn with_body(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Object body `{ statusCode, error, message }` with the canonical name
    fn standard(status: StatusCode, message: impl Into<Value>) -> Self {
        Self::with_body(
            status,
            json!({
                "statusCode": status.as_u16(),
                "error": canonical_error_name(status),
                "message": message.into(),
            }),
        )
    }

    pub fn bad_request(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::CONFLICT, message)
    }

    pub fn too_many_requests(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<Value>) -> Self {
        Self::standard(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body
    pub fn response(&self) -> &Value {
        &self.body
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Value::String(message) => write!(f, "{}: {}", self.status, message),
            body => match body.get("message") {
                Some(Value::String(message)) => write!(f, "{}: {}", self.status, message),
                Some(message) => write!(f, "{}: {}", self.status, message),
                None => write!(f, "{}", self.status),
            },
        }
    }
}

impl std::error::Error for HttpException {}

/// Generic error identified by name, e.g. `NotFoundError`
#[derive(Debug, Clone, Error)]
#[error("{name}: {message}")]
pub struct NamedError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl NamedError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Build from any error; the source chain becomes the stack
    pub fn from_error<E>(name: impl Into<String>, error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let name = name.into();
        let message = error.to_string();
        let mut stack = format!("{name}: {message}");
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            name,
            message,
            stack: Some(stack),
        }
    }
}

/// A thrown value that is not an error
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownThrow(pub Value);

impl UnknownThrow {
    /// Recover the message of a panic payload, if it has one
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            Self(Value::String((*message).to_string()))
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Self(Value::String(message.clone()))
        } else {
            Self(Value::Null)
        }
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for UnknownThrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write!(f, "{other}"),
        }
    }
}

/// Everything the exception filter can be handed
#[derive(Debug, Clone)]
pub enum Exception {
    Http(HttpException),
    Validation(ValidationException),
    Named(NamedError),
    Unknown(UnknownThrow),
}

impl Exception {
    pub fn unknown(value: impl Into<Value>) -> Self {
        Exception::Unknown(UnknownThrow(value.into()))
    }

    /// Status derived from the exception alone, before any configuration
    pub fn status(&self) -> StatusCode {
        match self {
            Exception::Http(http) => http.status(),
            Exception::Validation(_) => ValidationException::STATUS,
            Exception::Named(named) => status_for_error_name(&named.name),
            Exception::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the exception was raised deliberately with an HTTP status
    pub fn is_http(&self) -> bool {
        matches!(self, Exception::Http(_) | Exception::Validation(_))
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Exception::Http(http) => http.stack(),
            Exception::Named(named) => named.stack.as_deref(),
            Exception::Validation(_) | Exception::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::Http(err) => err.fmt(f),
            Exception::Validation(err) => err.fmt(f),
            Exception::Named(err) => err.fmt(f),
            Exception::Unknown(value) => write!(f, "Unknown throw: {value}"),
        }
    }
}

impl std::error::Error for Exception {}

impl From<HttpException> for Exception {
    fn from(err: HttpException) -> Self {
        Exception::Http(err)
    }
}

impl From<ValidationException> for Exception {
    fn from(err: ValidationException) -> Self {
        Exception::Validation(err)
    }
}

impl From<validator::ValidationErrors> for Exception {
    fn from(err: validator::ValidationErrors) -> Self {
        Exception::Validation(err.into())
    }
}

impl From<NamedError> for Exception {
    fn from(err: NamedError) -> Self {
        Exception::Named(err)
    }
}

impl From<anyhow::Error> for Exception {
    fn from(err: anyhow::Error) -> Self {
        // Allow handlers to bubble a typed exception through anyhow
        if let Some(exception) = err.downcast_ref::<Exception>() {
            return exception.clone();
        }
        if let Some(http) = err.downcast_ref::<HttpException>() {
            return Exception::Http(http.clone());
        }
        if let Some(named) = err.downcast_ref::<NamedError>() {
            return Exception::Named(named.clone());
        }

        Exception::Named(NamedError::new(GENERIC_ERROR, err.to_string()).with_stack(format!("{err:?}")))
    }
}

impl From<std::io::Error> for Exception {
    fn from(err: std::io::Error) -> Self {
        let name = match err.kind() {
            std::io::ErrorKind::TimedOut => TIMEOUT_ERROR,
            std::io::ErrorKind::NotFound => NOT_FOUND_ERROR,
            std::io::ErrorKind::PermissionDenied => FORBIDDEN_ERROR,
            _ => GENERIC_ERROR,
        };
        Exception::Named(NamedError::from_error(name, &err))
    }
}

impl From<jsonwebtoken::errors::Error> for Exception {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        let name = match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TOKEN_EXPIRED_ERROR,
            _ => JSON_WEB_TOKEN_ERROR,
        };
        Exception::Named(NamedError::from_error(name, &err))
    }
}
