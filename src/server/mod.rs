mod cache_janitor;
mod server;

pub use cache_janitor::*;
pub use server::*;
