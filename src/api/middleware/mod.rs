pub mod error_handling;
pub mod validation;

pub use error_handling::{ExceptionFilter, ExceptionFilterLayer, FilterOptions};
pub use validation::{validate_payload, ValidatedJson, ValidatedQuery};
