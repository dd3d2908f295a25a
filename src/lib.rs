//! Session Gate: signup, login, refresh-token rotation with reuse detection,
//! per-client rate limiting and role-gated routes over axum.

pub mod domains;
pub mod routes;
pub mod shared;

pub use routes::build_app;
