use crate::application_port::SessionError;
use crate::domain_model::*;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, decode_header, encode};

/// Stateless HS256 signer/verifier for access and refresh tokens.
///
/// Tokens are `base64url(header).base64url(claims).base64url(hmac)`. Signing is
/// deterministic: the same claims and secret always produce the same text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

fn malformed(reason: impl Into<String>) -> SessionError {
    SessionError::MalformedToken(reason.into())
}

impl TokenCodec {
    pub fn new() -> Self {
        TokenCodec
    }

    pub fn sign_access_token(
        &self,
        claims: &TokenClaims,
        secret: &SigningSecret,
    ) -> Result<String, SessionError> {
        Self::sign(TokenKind::Access, claims, secret)
    }

    pub fn sign_refresh_token(
        &self,
        claims: &TokenClaims,
        secret: &SigningSecret,
    ) -> Result<String, SessionError> {
        Self::sign(TokenKind::Refresh, claims, secret)
    }

    fn sign(
        kind: TokenKind,
        claims: &TokenClaims,
        secret: &SigningSecret,
    ) -> Result<String, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::Signing("signing secret is empty".to_owned()));
        }
        if claims.token_use != kind {
            return Err(SessionError::Signing(format!(
                "expected {:?} claims, got {:?}",
                kind, claims.token_use
            )));
        }
        if let Some(claim) = claims.missing_claim() {
            return Err(SessionError::Signing(format!("missing claim `{claim}`")));
        }

        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Decode the claims without looking at the signature. Used to learn the
    /// subject, issuer and expiry before the signing key is known.
    pub fn parse_unverified(&self, token: &str) -> Result<TokenClaims, SessionError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(malformed("token must have 3 segments separated by dots"));
        };

        let header = decode_header(token).map_err(|e| malformed(format!("header: {e}")))?;
        if header.alg != Algorithm::HS256 {
            return Err(malformed(format!("unsupported algorithm {:?}", header.alg)));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| malformed(format!("claims encoding: {e}")))?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|e| malformed(format!("claims: {e}")))?;

        if let Some(claim) = claims.missing_claim() {
            return Err(malformed(format!("missing claim `{claim}`")));
        }
        Ok(claims)
    }

    /// Recompute the HMAC over `header.claims` and compare it with the third segment.
    pub fn verify_signature(&self, token: &str, secret: &SigningSecret) -> Result<(), SessionError> {
        if secret.is_empty() {
            return Err(SessionError::Signing("signing secret is empty".to_owned()));
        }
        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| malformed("token has no signature segment"))?;

        let valid = jsonwebtoken::crypto::verify(
            signature,
            message.as_bytes(),
            &DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
        )
        .map_err(|e| malformed(format!("signature: {e}")))?;

        if valid {
            Ok(())
        } else {
            Err(SessionError::InvalidSignature)
        }
    }

    pub fn check_expiry(&self, claims: &TokenClaims, now: i64) -> Result<(), SessionError> {
        if claims.is_expired_at(now) {
            Err(SessionError::ExpiredToken)
        } else {
            Ok(())
        }
    }

    pub fn check_issuer(&self, claims: &TokenClaims, issuer: &str) -> Result<(), SessionError> {
        if claims.iss == issuer {
            Ok(())
        } else {
            Err(SessionError::InvalidIssuer)
        }
    }
}
