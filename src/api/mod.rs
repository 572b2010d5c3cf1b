pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;

pub use router::{apply_exception_filter, create_router, AppState};
