// handlers/public/mod.rs - Handlers reachable without authentication
//
// Routed behind `optional_auth`, so handlers may read an `Option<Extension<AuthUser>>`.

pub mod articles;
pub mod auth;
pub mod catalog;
pub mod posts;
pub mod qa;
pub mod resources;
pub mod system;
pub mod users;
