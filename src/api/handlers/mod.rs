pub mod failures;
pub mod health;
pub mod users;


pub use failures::failure_handler;
pub use health::{error_metrics_handler, health_handler};
pub use users::{
    create_user_handler, get_user_handler, list_users_cursor_handler, list_users_handler,
    UserDirectory,
};
