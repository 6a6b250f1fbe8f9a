pub mod auth;
pub mod response;

pub use auth::{optional_auth, require_auth, AuthUser};
pub use response::{ApiResponse, ApiResult};
