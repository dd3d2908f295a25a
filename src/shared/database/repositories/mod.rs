// Postgres repositories
pub mod auth;

pub use auth::*;
