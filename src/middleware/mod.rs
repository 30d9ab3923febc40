pub mod auth;
pub mod permissions;
pub mod response;

pub use auth::require_auth;
pub use permissions::check_permissions;
pub use response::{ApiResponse, ApiResult};
