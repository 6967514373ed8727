use crate::domain_port::{CipherError, SecretCipher};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use sha2::{Digest, Sha256};
use std::fmt;

const NONCE_LEN: usize = 12;

/// AES-256-GCM with a per-context key `SHA-256(master_key || context_key)`.
/// Ciphertext is `hex(nonce || sealed)`.
pub struct AesGcmSecretCipher {
    master_key: Vec<u8>,
}

impl AesGcmSecretCipher {
    pub fn new(master_key: impl Into<Vec<u8>>) -> Self {
        AesGcmSecretCipher {
            master_key: master_key.into(),
        }
    }

    fn cipher_for(&self, context_key: &str) -> Result<Aes256Gcm, CipherError> {
        let material = [self.master_key.as_slice(), context_key.as_bytes()].concat();
        let key = Sha256::digest(&material);
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| CipherError::Key)
    }
}

impl fmt::Debug for AesGcmSecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesGcmSecretCipher { .. }")
    }
}

impl SecretCipher for AesGcmSecretCipher {
    fn encrypt(&self, context_key: &str, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.cipher_for(context_key)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    fn decrypt(&self, context_key: &str, ciphertext: &str) -> Result<String, CipherError> {
        let bytes = hex::decode(ciphertext)?;
        if bytes.len() < NONCE_LEN {
            return Err(CipherError::Truncated);
        }
        let (nonce, sealed) = bytes.split_at(NONCE_LEN);

        let plaintext = self
            .cipher_for(context_key)?
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Decrypt)?;
        Ok(String::from_utf8(plaintext)?)
    }
}

/// Stores secrets as given. Development backend only.
#[derive(Debug, Default)]
pub struct FakeSecretCipher;

impl FakeSecretCipher {
    pub fn new() -> Self {
        FakeSecretCipher
    }
}

impl SecretCipher for FakeSecretCipher {
    fn encrypt(&self, _context_key: &str, plaintext: &str) -> Result<String, CipherError> {
        Ok(plaintext.to_owned())
    }

    fn decrypt(&self, _context_key: &str, ciphertext: &str) -> Result<String, CipherError> {
        Ok(ciphertext.to_owned())
    }
}
