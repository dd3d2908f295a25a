// Auth domain services
pub mod auth_service;
pub mod jwt_service;
pub mod password;
pub mod refresh_ledger;
pub mod state;

pub use auth_service::*;
pub use jwt_service::*;
pub use password::*;
pub use refresh_ledger::*;
pub use state::*;
