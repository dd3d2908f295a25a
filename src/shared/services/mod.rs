// Shared services
pub mod app_state;
pub mod cleanup_scheduler;

pub use app_state::*;
pub use cleanup_scheduler::*;
