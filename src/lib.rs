//! # api_envelope - Normalized error responses for axum services
//!
//! Every error a service raises leaves as one JSON shape, [`ErrorResponse`],
//! with a stable status, a correlation id and sensitive data redacted.
//! Successful responses use the envelope DTOs in [`dto`].
//!
//! ## Architecture Layers
//!
//! - **Domain**: Exception kinds, the error response shape, correlation ids
//! - **Application**: Ports (response sink, metrics, rate tracking) and DTOs
//! - **Infrastructure**: In-memory metrics and rate tracking adapters
//! - **API**: The exception filter, its tower layer, extractors and OpenAPI helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use api_envelope::api::{apply_exception_filter, middleware::{ExceptionFilter, FilterOptions}};
//! use axum::{routing::get, Router};
//!
//! let router: Router = Router::new().route("/", get(|| async { "ok" }));
//! let router = apply_exception_filter(router, ExceptionFilter::new(FilterOptions::production()));
//! # let _ = router;
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use application::{dto, ports};
pub use config::Config;
pub use domain::{ErrorResponse, Exception, HttpException, NamedError, ValidationException};
