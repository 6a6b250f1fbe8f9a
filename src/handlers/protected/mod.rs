// handlers/protected/mod.rs - Handlers requiring an authenticated user
//
// Routed behind `require_auth`; every handler can extract `Extension<AuthUser>`.

pub mod articles;
pub mod posts;
pub mod qa;
pub mod resources;
pub mod users;
