// Users domain module (protected routes)
pub mod handlers;
pub mod routes;

pub use routes::*;
