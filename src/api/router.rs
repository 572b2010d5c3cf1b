use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::handlers::{
    create_user_handler, error_metrics_handler, failure_handler, get_user_handler,
    health_handler, list_users_cursor_handler, list_users_handler, UserDirectory,
};
use crate::api::middleware::error_handling::{
    panic_to_exception, ExceptionFilter, ExceptionFilterLayer, FilterOptions,
};
use crate::api::openapi::swagger_ui;
use crate::domain::{Exception, HttpException};
use crate::infrastructure::{InMemoryErrorMetrics, InMemoryRateLimitTracker, RateTrackingConfig};

/// Application state container
#[derive(Clone)]
pub struct AppState {
    pub filter: ExceptionFilter,
    pub users: UserDirectory,
    pub metrics: InMemoryErrorMetrics,
    pub rate_tracker: InMemoryRateLimitTracker,
}

impl AppState {
    /// State backed by the in-memory collaborators
    pub fn new(options: FilterOptions, rate_tracking: RateTrackingConfig) -> Self {
        let metrics = InMemoryErrorMetrics::new();
        let rate_tracker = InMemoryRateLimitTracker::new(rate_tracking);
        let filter = ExceptionFilter::new(options)
            .with_metrics(Arc::new(metrics.clone()))
            .with_rate_limit_tracker(Arc::new(rate_tracker.clone()));

        Self {
            filter,
            users: UserDirectory::new(),
            metrics,
            rate_tracker,
        }
    }
}

/// Wrap a router so every error it produces leaves as an `ErrorResponse`
///
/// Panics are caught first and handed to the filter as unknown throws.
pub fn apply_exception_filter<S>(router: Router<S>, filter: ExceptionFilter) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_to_exception))
        .layer(ExceptionFilterLayer::from_filter(filter))
}

async fn route_not_found(method: Method, uri: Uri) -> Exception {
    HttpException::not_found(format!("Cannot {method} {}", uri.path())).into()
}

/// Create router with all routes and the exception filter
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/health/errors",
            get(error_metrics_handler).with_state(state.metrics.clone()),
        )
        .route(
            "/v1/users",
            get(list_users_handler)
                .post(create_user_handler)
                .with_state(state.users.clone()),
        )
        .route(
            "/v1/users/cursor",
            get(list_users_cursor_handler).with_state(state.users.clone()),
        )
        .route(
            "/v1/users/{id}",
            get(get_user_handler).with_state(state.users.clone()),
        )
        .route("/v1/failures/{kind}", get(failure_handler))
        .merge(swagger_ui())
        .fallback(route_not_found);

    apply_exception_filter(router, state.filter)
}
