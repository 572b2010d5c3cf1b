pub mod error_response;
pub mod error_types;
pub mod exception;
pub mod validation;
pub mod value_objects;

pub use error_response::ErrorResponse;
pub use exception::{Exception, HttpException, NamedError, UnknownThrow};
pub use validation::{FieldErrors, ValidationErrorItem, ValidationException};
pub use value_objects::CorrelationId;
