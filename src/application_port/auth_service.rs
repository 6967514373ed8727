use crate::application_port::SessionError;
use crate::domain_model::{ThirdPartySecret, TokenPair, User, UserId, UserProfile, UserScope};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("login id already taken in this scope")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("secret not found")]
    SecretNotFound,
    #[error("only admin users may manage secrets")]
    NotAdmin,
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub login_id: String,
    pub password: String,
    pub scope: UserScope,
    pub profile: UserProfile,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub login_id: String,
    pub password: String,
    pub scope: UserScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOperation {
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub struct RegisterSecretInput {
    pub credentials: LoginInput,
    pub secrets: Vec<ThirdPartySecret>,
}

#[derive(Debug, Clone)]
pub struct JwtAuthInput {
    pub credentials: LoginInput,
    pub key_name: String,
}

#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<User, AuthError>;
    async fn register_secret(
        &self,
        request: RegisterSecretInput,
        operation: SecretOperation,
    ) -> Result<(), AuthError>;
    async fn authenticate_jwt(&self, request: JwtAuthInput) -> Result<TokenPair, AuthError>;
}
