use crate::application_impl::TokenCodec;
use crate::application_port::{SessionError, SessionService};
use crate::domain_model::*;
use crate::infra_memory::SecretCache;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const CACHE_FLUSH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// `<domain>_<app_id>`; stamped on every token and required on verification.
    pub issuer: String,
    pub token_ttl: Duration,
    pub refresh_ttl: Duration,
    /// A session whose rotation count is above this is evicted on its next refresh.
    pub max_refresh_count: u32,
    pub cache_flush_interval: Duration,
}

impl SessionConfig {
    pub fn new(domain: &str, app_id: &str, max_refresh_count: u32) -> Self {
        SessionConfig {
            issuer: format!("{}_{}", domain, app_id),
            token_ttl: ACCESS_TOKEN_TTL,
            refresh_ttl: REFRESH_TOKEN_TTL,
            max_refresh_count,
            cache_flush_interval: CACHE_FLUSH_INTERVAL,
        }
    }
}

/// Issues token pairs and rotates refresh chains on top of [`SecretCache`].
///
/// Per user: `Unauthenticated -> Active(0) -> Active(1) -> ... -> evicted`.
/// A new issue always restarts at `Active(0)`.
pub struct RotationEngine {
    config: SessionConfig,
    cache: Arc<SecretCache>,
    codec: TokenCodec,
}

impl RotationEngine {
    pub fn new(config: SessionConfig, cache: Arc<SecretCache>) -> Self {
        RotationEngine {
            config,
            cache,
            codec: TokenCodec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    fn now() -> i64 {
        Utc::now().timestamp()
    }

    fn pair(&self, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token: Token {
                text: access_token,
                ttl: self.config.token_ttl,
            },
            refresh_token: Token {
                text: refresh_token,
                ttl: self.config.refresh_ttl,
            },
        }
    }

    /// Everything a refresh does once the cache entry is locked and under the
    /// ceiling. Returns `(access, refresh)` texts.
    fn mint_rotation(
        &self,
        context: &SigningContext,
        presented: &str,
    ) -> Result<(String, String), SessionError> {
        self.codec.verify_signature(presented, &context.secret)?;
        if presented != context.current_refresh_token {
            return Err(SessionError::InvalidRefreshToken);
        }

        let claims = self.codec.parse_unverified(presented)?;
        if claims.token_use != TokenKind::Refresh {
            return Err(SessionError::InvalidRefreshToken);
        }
        self.codec.check_issuer(&claims, &self.config.issuer)?;
        let now = Self::now();
        self.codec.check_expiry(&claims, now)?;

        // identity comes from the refresh token, timestamps are fresh
        let access = TokenClaims::access(
            claims.sub.clone(),
            claims.iss.clone(),
            None,
            None,
            now,
            self.config.token_ttl,
        );
        let access_token = self.codec.sign_access_token(&access, &context.secret)?;
        let refresh_token = self.codec.sign_refresh_token(&claims, &context.secret)?;
        Ok((access_token, refresh_token))
    }
}

impl SessionService for RotationEngine {
    fn issue_session(
        &self,
        user_id: &UserId,
        secret: SigningSecret,
        user: &User,
    ) -> Result<TokenPair, SessionError> {
        if secret.is_empty() {
            warn!(%user_id, "refusing to issue session with empty secret");
            return Err(SessionError::Signing("signing secret is empty".to_owned()));
        }

        let now = Self::now();
        let access = TokenClaims::access(
            user_id.as_str(),
            self.config.issuer.as_str(),
            Some(user.scope.audience()),
            Some(user.display_name()),
            now,
            self.config.token_ttl,
        );
        let refresh = TokenClaims::refresh(
            user_id.as_str(),
            self.config.issuer.as_str(),
            now,
            self.config.refresh_ttl,
        );

        let access_token = self.codec.sign_access_token(&access, &secret)?;
        let refresh_token = self.codec.sign_refresh_token(&refresh, &secret)?;
        self.cache
            .install(user_id.clone(), secret, refresh_token.clone());

        info!(%user_id, "session issued");
        Ok(self.pair(access_token, refresh_token))
    }

    fn refresh_session(
        &self,
        user_id: &UserId,
        presented_refresh_token: &str,
    ) -> Result<TokenPair, SessionError> {
        // The ceiling is checked before the presented token is looked at, so a
        // session at its limit is rejected even with a valid token.
        let result = self
            .cache
            .rotate(user_id, self.config.max_refresh_count, |context| {
                let (access, refresh) = self.mint_rotation(context, presented_refresh_token)?;
                Ok(((access, refresh.clone()), refresh))
            });

        match result {
            Ok(((access_token, refresh_token), rotation_count)) => {
                info!(%user_id, rotation_count, "session refreshed");
                Ok(self.pair(access_token, refresh_token))
            }
            Err(e) => {
                if e == SessionError::RotationCeilingExceeded {
                    info!(%user_id, "refresh ceiling reached, session evicted");
                } else {
                    warn!(%user_id, error = e.kind(), "refresh rejected");
                }
                Err(e)
            }
        }
    }

    fn claimed_subject(&self, token: &str) -> Result<UserId, SessionError> {
        let claims = self.codec.parse_unverified(token)?;
        Ok(UserId(claims.sub))
    }

    fn authorize(&self, bearer_token: &str) -> Result<TokenClaims, SessionError> {
        let claims = self.codec.parse_unverified(bearer_token)?;
        self.codec.check_expiry(&claims, Self::now())?;
        self.codec.check_issuer(&claims, &self.config.issuer)?;

        let user_id = UserId::from(claims.sub.as_str());
        let context = self
            .cache
            .get(&user_id)
            .ok_or(SessionError::UnknownSession)?;
        self.codec.verify_signature(bearer_token, &context.secret)?;

        debug!(%user_id, token_use = ?claims.token_use, "bearer authorized");
        Ok(claims)
    }
}
