use crate::application_port::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("ciphertext is not valid hex: {0}")]
    Encoding(#[from] hex::FromHexError),
    #[error("ciphertext is too short")]
    Truncated,
    #[error("derived key has the wrong length")]
    Key,
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed, wrong key or tampered ciphertext")]
    Decrypt,
    #[error("plaintext is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<CipherError> for AuthError {
    fn from(error: CipherError) -> Self {
        AuthError::InternalError(error.to_string())
    }
}

/// At-rest protection for third-party secrets. `context_key` binds the
/// ciphertext to one deployment (`<domain><app_id>`).
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, context_key: &str, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, context_key: &str, ciphertext: &str) -> Result<String, CipherError>;
}
