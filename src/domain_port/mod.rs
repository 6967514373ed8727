mod secret_cipher;
mod user_store;

pub use secret_cipher::*;
pub use user_store::*;
