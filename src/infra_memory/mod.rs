mod secret_cache;
mod user_store_memory;

pub use secret_cache::*;
pub use user_store_memory::*;
