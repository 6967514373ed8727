mod account_service_impl;
mod credential_verifier_impl;
mod rotation_engine;
mod secret_cipher_impl;
mod token_codec;

pub use account_service_impl::*;
pub use credential_verifier_impl::*;
pub use rotation_engine::*;
pub use secret_cipher_impl::*;
pub use token_codec::*;
