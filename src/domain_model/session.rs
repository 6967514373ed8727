use crate::domain_model::UserId;
use std::fmt;
use std::sync::Arc;

/// Per-user HMAC key material. Cheap to clone, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        SigningSecret(Arc::from(bytes.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes>)", self.0.len())
    }
}

impl From<&str> for SigningSecret {
    fn from(s: &str) -> Self {
        SigningSecret::new(s.as_bytes())
    }
}

/// One cache entry: everything needed to rotate a user's refresh chain.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub user_id: UserId,
    pub secret: SigningSecret,
    pub rotation_count: u32,
    pub current_refresh_token: String,
}

impl SigningContext {
    pub fn new(user_id: UserId, secret: SigningSecret) -> Self {
        SigningContext {
            user_id,
            secret,
            rotation_count: 0,
            current_refresh_token: String::new(),
        }
    }
}
