use axum::response::{IntoResponse, Response};

use crate::domain::{Exception, HttpException, NamedError, ValidationException};

/// Bare response carrying the exception in its extensions
///
/// The body is left empty: `ExceptionFilterLayer` picks the exception up and
/// renders the normalized payload.
impl IntoResponse for Exception {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        Exception::from(self).into_response()
    }
}

impl IntoResponse for ValidationException {
    fn into_response(self) -> Response {
        Exception::from(self).into_response()
    }
}

impl IntoResponse for NamedError {
    fn into_response(self) -> Response {
        Exception::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_exception_response_carries_exception() {
        let response = HttpException::forbidden("no access").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(matches!(
            response.extensions().get::<Exception>(),
            Some(Exception::Http(_))
        ));
    }

    #[test]
    fn test_named_error_response_status() {
        let response = NamedError::new("TimeoutError", "upstream slow").into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
