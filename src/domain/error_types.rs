//! Error taxonomy tables
//!
//! Two fixed lookup tables drive status classification: error names
//! (as carried by [`NamedError`](super::exception::NamedError)) map to HTTP
//! status codes, and status codes map back to canonical human-readable names.

use axum::http::StatusCode;

pub const VALIDATION_ERROR: &str = "ValidationError";
pub const UNAUTHORIZED_ERROR: &str = "UnauthorizedError";
pub const JSON_WEB_TOKEN_ERROR: &str = "JsonWebTokenError";
pub const TOKEN_EXPIRED_ERROR: &str = "TokenExpiredError";
pub const FORBIDDEN_ERROR: &str = "ForbiddenError";
pub const NOT_FOUND_ERROR: &str = "NotFoundError";
pub const CONFLICT_ERROR: &str = "ConflictError";
pub const TIMEOUT_ERROR: &str = "TimeoutError";
pub const PAYLOAD_TOO_LARGE_ERROR: &str = "PayloadTooLargeError";
pub const TOO_MANY_REQUESTS_ERROR: &str = "TooManyRequestsError";

/// Name given to errors that carry no more specific classification
pub const GENERIC_ERROR: &str = "Error";

/// Canonical name used for status codes missing from the table
pub const UNKNOWN_ERROR_NAME: &str = "Unknown Error";

/// Map an error name to its HTTP status, defaulting to 500
pub fn status_for_error_name(name: &str) -> StatusCode {
    match name {
        VALIDATION_ERROR => StatusCode::BAD_REQUEST,
        UNAUTHORIZED_ERROR | JSON_WEB_TOKEN_ERROR | TOKEN_EXPIRED_ERROR => {
            StatusCode::UNAUTHORIZED
        }
        FORBIDDEN_ERROR => StatusCode::FORBIDDEN,
        NOT_FOUND_ERROR => StatusCode::NOT_FOUND,
        CONFLICT_ERROR => StatusCode::CONFLICT,
        TIMEOUT_ERROR => StatusCode::REQUEST_TIMEOUT,
        PAYLOAD_TOO_LARGE_ERROR => StatusCode::PAYLOAD_TOO_LARGE,
        TOO_MANY_REQUESTS_ERROR => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Canonical human-readable name for a status code
pub fn canonical_error_name(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => UNKNOWN_ERROR_NAME,
    }
}
