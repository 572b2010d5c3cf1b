use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::Validate;

use crate::domain::error_types::canonical_error_name;
use crate::domain::{Exception, HttpException};

/// Validate a payload, turning failures into a validation exception
pub fn validate_payload<T>(payload: &T) -> Result<(), Exception>
where
    T: Validate,
{
    payload.validate().map_err(Exception::from)
}

/// JSON body extractor that also runs `validator` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                rejection_exception(rejection.status(), rejection.body_text())
            })?;
        validate_payload(&value)?;
        Ok(Self(value))
    }
}

/// Query string extractor that also runs `validator` rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Exception;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                rejection_exception(rejection.status(), rejection.body_text())
            })?;
        validate_payload(&value)?;
        Ok(Self(value))
    }
}

fn rejection_exception(status: StatusCode, message: String) -> Exception {
    HttpException::with_body(
        status,
        json!({
            "error": canonical_error_name(status),
            "message": message,
        }),
    )
    .into()
}
