// handlers/mod.rs - HTTP handlers grouped by access tier
//
// public:    no token required; identity is attached when a valid one is present
// protected: a valid token is required (Bearer header or session cookie)

pub mod protected;
pub mod public;
