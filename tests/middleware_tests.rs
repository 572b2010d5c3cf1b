//! End-to-end tests driving the demo router through the exception filter
//!
//! Every request goes through `tower::ServiceExt::oneshot`, so the catch-panic
//! layer, the filter layer and the handlers all run exactly as in the binary.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_envelope::api::middleware::FilterOptions;
use api_envelope::api::{create_router, AppState};
use api_envelope::infrastructure::RateTrackingConfig;

fn app_with(options: FilterOptions) -> Router {
    create_router(AppState::new(options, RateTrackingConfig::default()))
}

fn app() -> Router {
    app_with(FilterOptions::production())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = app.clone().oneshot(request).await.unwrap();
    (response.status(), response)
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_passes_through() {
    let app = app();
    let (status, response) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.headers().get("x-frame-options").is_none());
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_handler_panic_becomes_500() {
    let app = app();
    let (status, response) = send(&app, get("/v1/failures/panic")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["message"], "An unexpected error occurred");
    assert_eq!(body["path"], "/v1/failures/panic");
}

#[tokio::test]
async fn test_generic_error_end_to_end() {
    let app = app();
    let (status, response) = send(&app, get("/v1/failures/generic")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["message"], "Generic error");
}

#[tokio::test]
async fn test_http_exception_end_to_end() {
    let app = app();
    let (status, response) = send(&app, get("/v1/failures/http")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Test error");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_unmatched_route_is_normalized() {
    let app = app();
    let (status, response) = send(&app, get("/does/not/exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    let body = json_body(response).await;
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Cannot GET /does/not/exist");
    assert_eq!(body["path"], "/does/not/exist");
}

#[tokio::test]
async fn test_method_not_allowed_is_normalized() {
    let app = app();
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/v1/users")
        .body(Body::empty())
        .unwrap();
    let (status, response) = send(&app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let body = json_body(response).await;
    assert_eq!(body["statusCode"], 405);
    assert_eq!(body["error"], "Method Not Allowed");
}

#[tokio::test]
async fn test_validation_failure_reports_field_errors() {
    let app = app();
    let (status, response) = send(
        &app,
        post_json("/v1/users", json!({ "name": "", "email": "nope" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    let field_errors = body["fieldErrors"].as_object().unwrap();
    assert!(field_errors.contains_key("name"));
    assert!(field_errors.contains_key("email"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, response) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_missing_content_type_is_unsupported_media_type() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/users")
        .body(Body::from(r#"{"name":"Ada","email":"ada@example.com"}"#))
        .unwrap();
    let (status, response) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unsupported Media Type");
}

#[tokio::test]
async fn test_correlation_header_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/v1/users/999")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .unwrap();
    let (status, response) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get("x-correlation-id").unwrap(), "req-abc");
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-abc");
    let body = json_body(response).await;
    assert_eq!(body["requestId"], "req-abc");
    assert_eq!(body["message"], "User 999 not found");
}

#[tokio::test]
async fn test_sensitive_message_redacted_in_production() {
    let app = app();
    let (_, response) = send(&app, get("/v1/failures/sensitive")).await;
    let body = json_body(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("[REDACTED]"));
    assert!(!message.contains("hunter2"));
}

#[tokio::test]
async fn test_development_includes_request_details() {
    let app = app_with(FilterOptions::development());
    let request = Request::builder()
        .uri("/v1/failures/sensitive")
        .header(header::USER_AGENT, "integration-test")
        .body(Body::empty())
        .unwrap();
    let (_, response) = send(&app, request).await;
    let body = json_body(response).await;

    assert!(body["message"].as_str().unwrap().contains("hunter2"));
    assert_eq!(body["method"], "GET");
    assert_eq!(body["userAgent"], "integration-test");
}

#[tokio::test]
async fn test_user_lifecycle_and_pagination() {
    let app = app();
    for (name, email) in [("Ada", "ada@example.com"), ("Bob", "bob@example.com"), ("Cy", "cy@example.com")] {
        let (status, response) = send(
            &app,
            post_json("/v1/users", json!({ "name": name, "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], name);
    }

    let (status, response) = send(&app, get("/v1/users?page=2&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
    assert_eq!(body["meta"]["hasNextPage"], false);
    assert_eq!(body["meta"]["hasPreviousPage"], true);

    let (status, response) = send(&app, get("/v1/users/cursor?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["meta"]["hasMore"], true);
    assert_eq!(body["meta"]["nextCursor"], "2");

    let (status, response) = send(
        &app,
        post_json("/v1/users", json!({ "name": "Ada", "email": "ADA@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn test_out_of_range_limit_is_validation_error() {
    let app = app();
    let (status, response) = send(&app, get("/v1/users?limit=500")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "limit must be between 1 and 100");
}

#[tokio::test]
async fn test_error_metrics_endpoint_counts_errors() {
    let app = app_with(FilterOptions::production().with_metrics(true));
    send(&app, get("/v1/failures/http")).await;
    send(&app, get("/v1/failures/http")).await;
    send(&app, get("/v1/failures/generic")).await;

    let (status, response) = send(&app, get("/health/errors")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["clientErrors"], 2);
    assert_eq!(body["data"]["serverErrors"], 1);
}

#[tokio::test]
async fn test_error_metrics_keyed_by_route_template() {
    let app = app_with(FilterOptions::production().with_metrics(true));
    send(&app, get("/v1/failures/http")).await;
    send(&app, get("/v1/failures/generic?attempt=2")).await;

    let (_, response) = send(&app, get("/health/errors")).await;
    let body = json_body(response).await;
    let counters = body["data"]["counters"].as_array().unwrap();
    assert!(counters.iter().all(|row| row["path"] == "/v1/failures/{kind}"));
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_random_not_found_paths_share_one_counter() {
    let app = app_with(FilterOptions::production().with_metrics(true));
    for i in 0..500 {
        let (status, _) = send(&app, get(&format!("/scan-{i}/wp-admin.php?x={i}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (_, response) = send(&app, get("/health/errors")).await;
    let body = json_body(response).await;
    assert_eq!(
        body["data"]["counters"],
        json!([{ "status": 404, "path": "<unmatched>", "method": "GET", "count": 500 }])
    );
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = app();
    let (status, response) = send(&app, get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["components"]["schemas"]["ErrorResponse"].is_object());
    assert!(body["paths"]["/v1/failures/{kind}"].is_object());
}
