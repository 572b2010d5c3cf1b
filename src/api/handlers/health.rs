use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::dto::ApiResponse;
use crate::infrastructure::{ErrorCount, InMemoryErrorMetrics};

/// Basic health check response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Error counters collected by the exception filter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMetricsReport {
    pub total: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub counters: Vec<ErrorCount>,
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthResponse>)
    )
)]
pub async fn health_handler() -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::ok(HealthResponse {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })),
    )
}

/// GET /health/errors
pub async fn error_metrics_handler(
    State(metrics): State<InMemoryErrorMetrics>,
) -> Json<ApiResponse<ErrorMetricsReport>> {
    Json(ApiResponse::ok(ErrorMetricsReport {
        total: metrics.total(),
        client_errors: metrics.total_for_class(4),
        server_errors: metrics.total_for_class(5),
        counters: metrics.snapshot(),
    }))
}
