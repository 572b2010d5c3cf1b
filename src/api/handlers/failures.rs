use std::io;

use axum::{extract::Path, http::StatusCode, response::Json};
use jsonwebtoken::{DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::api::openapi::StandardErrorResponses;
use crate::application::dto::ApiResponse;
use crate::domain::validation::ValidationErrorItem;
use crate::domain::{Exception, HttpException, NamedError, ValidationException};

/// Raise the exception matching `kind`
pub fn raise(kind: &str) -> Result<(), Exception> {
    match kind {
        "http" => Err(HttpException::new(StatusCode::TOO_MANY_REQUESTS, "Test error").into()),
        "object" => Err(HttpException::unauthorized("Token missing").into()),
        "named" => Err(NamedError::new("NotFoundError", "Record not found").into()),
        "generic" => Err(anyhow::anyhow!("Generic error").into()),
        "validation" => Err(ValidationException::new(vec![
            ValidationErrorItem::new("email")
                .with_constraint("isEmail", "email must be an email")
                .with_value("not-an-email"),
            ValidationErrorItem::new("name").with_constraint("isNotEmpty", "name should not be empty"),
        ])
        .into()),
        "io" => Err(io::Error::new(io::ErrorKind::TimedOut, "upstream timed out").into()),
        "jwt" => {
            jsonwebtoken::decode::<Value>(
                "not-a-jwt",
                &DecodingKey::from_secret(b"demo-secret"),
                &Validation::default(),
            )?;
            Ok(())
        }
        "sensitive" => Err(NamedError::new(
            "Error",
            "Login failed for admin@example.com with password: hunter2",
        )
        .into()),
        "unknown" => Err(Exception::unknown("string throw")),
        "panic" => panic!("handler panicked"),
        "none" => Ok(()),
        other => Err(HttpException::not_found(format!("Unknown failure kind {other}")).into()),
    }
}

/// GET /v1/failures/{kind}
#[utoipa::path(
    get,
    path = "/v1/failures/{kind}",
    tag = "failures",
    params(("kind" = String, Path, description = "http, object, named, generic, validation, io, jwt, sensitive, unknown, panic or none")),
    responses(
        (status = 200, description = "Kind `none` succeeds", body = ApiResponse<String>),
        StandardErrorResponses
    )
)]
pub async fn failure_handler(
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<String>>, Exception> {
    debug!(kind = %kind, "failure_requested");
    raise(&kind)?;
    Ok(Json(ApiResponse::ok(kind).with_message("No failure raised")))
}
