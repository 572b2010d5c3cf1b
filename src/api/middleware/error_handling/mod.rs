//! Exception filter: normalizes every error into one response shape
//!
//! The module is split into focused components:
//! - config.rs: Filter options and loading
//! - taxonomy.rs: Exception to status and raw body
//! - sanitizers.rs: Redaction of credentials and personal data
//! - correlation.rs: Correlation id resolution
//! - client_ip.rs: Client address resolution
//! - payload.rs: `ErrorResponse` assembly
//! - dispatcher.rs: Security headers, logging and the guarded write
//! - filter.rs: Orchestration and fallback
//! - middleware.rs: Tower layer and axum response sink

pub mod client_ip;
pub mod config;
pub mod correlation;
pub mod dispatcher;
pub mod filter;
pub mod middleware;
pub mod payload;
pub mod sanitizers;
pub mod taxonomy;

pub use client_ip::resolve_client_ip;
pub use config::{ConfigError, FilterOptions};
pub use correlation::CorrelationTracker;
pub use dispatcher::{DispatchContext, ResponseDispatcher};
pub use filter::ExceptionFilter;
pub use middleware::{
    normalize_response, panic_to_exception, BufferedResponse, ExceptionFilterLayer,
    ExceptionFilterService,
};
pub use payload::ErrorPayloadBuilder;
pub use sanitizers::ErrorSanitizer;
pub use taxonomy::{Classification, ErrorTaxonomyMapper};
