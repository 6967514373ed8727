use crate::domain_model::{SigningSecret, TokenClaims, TokenPair, User, UserId};

/// Every way an issue, refresh or authorize call can be rejected.
/// All variants are terminal for the call; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("signing error: {0}")]
    Signing(String),
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("refresh token is not the active one for this session")]
    InvalidRefreshToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("no active session, authenticate again")]
    UnknownSession,
    #[error("refresh limit reached, authenticate again")]
    RotationCeilingExceeded,
    #[error("token issuer is not accepted")]
    InvalidIssuer,
}

impl SessionError {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Signing(_) => "signing",
            SessionError::MalformedToken(_) => "malformed_token",
            SessionError::InvalidSignature => "invalid_signature",
            SessionError::InvalidRefreshToken => "invalid_refresh_token",
            SessionError::ExpiredToken => "expired_token",
            SessionError::UnknownSession => "unknown_session",
            SessionError::RotationCeilingExceeded => "rotation_ceiling_exceeded",
            SessionError::InvalidIssuer => "invalid_issuer",
        }
    }
}

pub trait SessionService: Send + Sync {
    /// Start (or restart) the session of `user_id` and mint its first token pair.
    fn issue_session(
        &self,
        user_id: &UserId,
        secret: SigningSecret,
        user: &User,
    ) -> Result<TokenPair, SessionError>;

    /// Rotate the refresh chain of `user_id` and mint a fresh access token.
    fn refresh_session(
        &self,
        user_id: &UserId,
        presented_refresh_token: &str,
    ) -> Result<TokenPair, SessionError>;

    /// Subject named by a token, read without verifying it. Refresh uses this
    /// to find the session; every check is left to `refresh_session`.
    fn claimed_subject(&self, token: &str) -> Result<UserId, SessionError>;

    /// Validate a bearer token against the live session of its subject.
    fn authorize(&self, bearer_token: &str) -> Result<TokenClaims, SessionError>;
}
