use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login_id: String,
    pub password_hash: String,
    pub scope: UserScope,
    pub profile: UserProfile,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<UserId, AuthError>;

    /// `true` unless the login id is already taken inside the same domain/app.
    async fn login_id_available(&self, login_id: &str, scope: &UserScope)
    -> Result<bool, AuthError>;

    /// Fetch by login id and require the stored domain/app to match.
    /// Fails with `UserNotFound` on either miss.
    async fn find_by_login_and_scope(
        &self,
        login_id: &str,
        domain: &str,
        app_id: &str,
    ) -> Result<UserRecord, AuthError>;

    /// Encrypted value of the named secret. Fails with `SecretNotFound`.
    async fn lookup_secret(&self, user_id: &UserId, key_name: &str) -> Result<String, AuthError>;

    /// `secret.key_value` must already be encrypted.
    async fn upsert_secret(
        &self,
        user_id: &UserId,
        secret: &ThirdPartySecret,
        operation: SecretOperation,
    ) -> Result<(), AuthError>;
}
