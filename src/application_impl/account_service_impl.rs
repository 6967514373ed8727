use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::info;

pub struct RealAccountService {
    user_store: Arc<dyn UserStore>,
    credential_verifier: Arc<dyn CredentialVerifier>,
    secret_cipher: Arc<dyn SecretCipher>,
    session_service: Arc<dyn SessionService>,
    context_key: String,
    min_login_id_len: usize,
    max_login_id_len: usize,
    min_password_len: usize,
}

impl RealAccountService {
    /// `context_key` binds stored secrets to this deployment, `<domain><app_id>`.
    pub fn new(
        user_store: Arc<dyn UserStore>,
        credential_verifier: Arc<dyn CredentialVerifier>,
        secret_cipher: Arc<dyn SecretCipher>,
        session_service: Arc<dyn SessionService>,
        context_key: impl Into<String>,
    ) -> Self {
        Self {
            user_store,
            credential_verifier,
            secret_cipher,
            session_service,
            context_key: context_key.into(),
            min_login_id_len: 2,
            max_login_id_len: 100,
            min_password_len: 4,
        }
    }

    fn validate_credentials(&self, credentials: &LoginInput) -> Result<(), AuthError> {
        let len = credentials.login_id.chars().count();
        if len < self.min_login_id_len || len > self.max_login_id_len {
            return Err(AuthError::Validation(format!(
                "login id must be {}..={} characters",
                self.min_login_id_len, self.max_login_id_len
            )));
        }
        if credentials.password.chars().count() < self.min_password_len {
            return Err(AuthError::Validation("password too short".to_string()));
        }
        if credentials.scope.domain.is_empty() || credentials.scope.app_id.is_empty() {
            return Err(AuthError::Validation("scope domain and app id are required".to_string()));
        }
        Ok(())
    }

    /// Look the user up inside its scope and check the password. Both misses
    /// surface as `InvalidCredentials`.
    async fn verified_user(&self, credentials: &LoginInput) -> Result<User, AuthError> {
        self.validate_credentials(credentials)?;

        let record = self
            .user_store
            .find_by_login_and_scope(
                &credentials.login_id,
                &credentials.scope.domain,
                &credentials.scope.app_id,
            )
            .await
            .map_err(|e| match e {
                AuthError::UserNotFound => AuthError::InvalidCredentials,
                other => other,
            })?;

        let ok = self
            .credential_verifier
            .verify_password(&credentials.password, &record.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(record.user)
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        let SignupInput {
            login_id,
            password,
            scope,
            profile,
        } = request;

        self.validate_credentials(&LoginInput {
            login_id: login_id.clone(),
            password: password.clone(),
            scope: scope.clone(),
        })?;
        if scope.role.role_name.is_empty() {
            return Err(AuthError::Validation("user role is required".to_string()));
        }

        if !self.user_store.login_id_available(&login_id, &scope).await? {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.credential_verifier.hash_password(&password).await?;
        let user_id = self
            .user_store
            .create_user(NewUser {
                login_id,
                password_hash,
                scope,
                profile,
            })
            .await?;

        info!(%user_id, "user created");
        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<User, AuthError> {
        self.verified_user(&request).await
    }

    async fn register_secret(
        &self,
        request: RegisterSecretInput,
        operation: SecretOperation,
    ) -> Result<(), AuthError> {
        let RegisterSecretInput {
            credentials,
            secrets,
        } = request;

        let [secret] = secrets.as_slice() else {
            return Err(AuthError::Validation(
                "exactly one secret is required".to_string(),
            ));
        };
        if secret.key_name.is_empty() || secret.key_value.is_empty() {
            return Err(AuthError::Validation(
                "secret key name and value are required".to_string(),
            ));
        }

        let user = self.verified_user(&credentials).await?;
        if !user.is_admin() {
            return Err(AuthError::NotAdmin);
        }

        let sealed = ThirdPartySecret {
            key_name: secret.key_name.clone(),
            key_value: self
                .secret_cipher
                .encrypt(&self.context_key, &secret.key_value)?,
            description: secret.description.clone(),
        };
        self.user_store
            .upsert_secret(&user.id, &sealed, operation)
            .await?;

        info!(user_id = %user.id, key_name = %sealed.key_name, ?operation, "secret stored");
        Ok(())
    }

    async fn authenticate_jwt(&self, request: JwtAuthInput) -> Result<TokenPair, AuthError> {
        if request.key_name.is_empty() {
            return Err(AuthError::Validation(
                "secret key name is required".to_string(),
            ));
        }

        let user = self.verified_user(&request.credentials).await?;
        let sealed = self
            .user_store
            .lookup_secret(&user.id, &request.key_name)
            .await?;
        let plaintext = self.secret_cipher.decrypt(&self.context_key, &sealed)?;

        let pair = self
            .session_service
            .issue_session(&user.id, SigningSecret::new(plaintext), &user)?;
        Ok(pair)
    }
}
