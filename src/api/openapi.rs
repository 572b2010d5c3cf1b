use std::collections::BTreeMap;

use utoipa::openapi::{ContentBuilder, Ref, RefOr, ResponseBuilder};
use utoipa::{IntoResponses, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::users::{CreateUserRequest, UserDto};
use crate::application::dto::{
    CursorMeta, CursorPaginationQuery, PaginationMeta, PaginationQuery,
};
use crate::domain::ErrorResponse;

/// Error responses shared by every endpoint, each with an `ErrorResponse` body
pub struct StandardErrorResponses;

impl StandardErrorResponses {
    pub const STATUSES: [(u16, &'static str); 6] = [
        (400, "Malformed request or failed validation"),
        (401, "Missing or invalid credentials"),
        (403, "Authenticated but not allowed"),
        (404, "Resource not found"),
        (429, "Too many requests"),
        (500, "Unexpected server error"),
    ];
}

impl IntoResponses for StandardErrorResponses {
    fn responses() -> BTreeMap<String, RefOr<utoipa::openapi::response::Response>> {
        Self::STATUSES
            .iter()
            .map(|(status, description)| {
                let response = ResponseBuilder::new()
                    .description(*description)
                    .content(
                        "application/json",
                        ContentBuilder::new()
                            .schema(Some(Ref::from_schema_name("ErrorResponse")))
                            .build(),
                    )
                    .build();
                (status.to_string(), response.into())
            })
            .collect()
    }
}

/// OpenAPI document for the demo service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Envelope Demo",
        version = "0.1.0",
        description = "Standard response envelopes and normalized error responses"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::users::create_user_handler,
        crate::api::handlers::users::get_user_handler,
        crate::api::handlers::users::list_users_handler,
        crate::api::handlers::users::list_users_cursor_handler,
        crate::api::handlers::failures::failure_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationQuery,
            CursorMeta,
            CursorPaginationQuery,
            CreateUserRequest,
            UserDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "In-memory user directory"),
        (name = "failures", description = "Endpoints that raise each error kind")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI route
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
