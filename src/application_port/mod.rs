mod auth_service;
mod session_service;

pub use auth_service::*;
pub use session_service::*;
