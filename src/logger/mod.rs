//! Global `tracing` setup with a filter that settings can replace at startup.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
