use crate::application_port::{AuthError, CredentialVerifier};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Argon2id PHC hashes. Hashing is CPU heavy, so it runs on the blocking pool.
#[derive(Debug, Default)]
pub struct Argon2CredentialVerifier;

impl Argon2CredentialVerifier {
    pub fn new() -> Self {
        Argon2CredentialVerifier
    }

    fn hash_blocking(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("hash error: {e}")))
    }

    fn verify_blocking(password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for Argon2CredentialVerifier {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash_blocking(&password))
            .await
            .map_err(|e| AuthError::InternalError(format!("hash task: {e}")))?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &password_hash))
            .await
            .map_err(|e| AuthError::InternalError(format!("verify task: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_verifies_only_the_hashed_password() {
        let verifier = Argon2CredentialVerifier::new();
        let hash = verifier.hash_password("hunter22").await.unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verifier.verify_password("hunter22", &hash).await.unwrap());
        assert!(!verifier.verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_internal_error() {
        let verifier = Argon2CredentialVerifier::new();
        let result = verifier.verify_password("pw", "not-a-phc-string").await;
        assert!(matches!(result, Err(AuthError::InternalError(_))));
    }
}
