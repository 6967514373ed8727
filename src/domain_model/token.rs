use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims set embedded in every token this service signs.
///
/// Field order is the serialization order, which keeps signing deterministic:
/// re-signing the same claims with the same secret yields the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iss: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    pub exp: i64,
    pub token_use: TokenKind,
}

impl TokenClaims {
    pub fn access(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        audience: Option<String>,
        name: Option<String>,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        TokenClaims {
            name,
            sub: subject.into(),
            aud: audience,
            iss: issuer.into(),
            iat: issued_at,
            typ: Some("JWT".to_owned()),
            exp: issued_at + ttl.as_secs() as i64,
            token_use: TokenKind::Access,
        }
    }

    pub fn refresh(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        issued_at: i64,
        ttl: Duration,
    ) -> Self {
        TokenClaims {
            name: None,
            sub: subject.into(),
            aud: None,
            iss: issuer.into(),
            iat: issued_at,
            typ: None,
            exp: issued_at + ttl.as_secs() as i64,
            token_use: TokenKind::Refresh,
        }
    }

    /// Name of the first required claim that is absent or empty.
    pub fn missing_claim(&self) -> Option<&'static str> {
        if self.sub.is_empty() {
            Some("sub")
        } else if self.iss.is_empty() {
            Some("iss")
        } else if self.exp <= 0 {
            Some("exp")
        } else {
            None
        }
    }

    /// Strict comparison: a token whose `exp` equals `now` is still valid.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "access_token")]
    pub text: String,
    #[serde(rename = "expiry_time", serialize_with = "as_secs")]
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    #[serde(rename = "token")]
    pub access_token: Token,
    pub refresh_token: Token,
}

fn as_secs<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(ttl.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_strict() {
        let claims = TokenClaims::refresh("u1", "iss", 100, Duration::from_secs(50));
        assert_eq!(claims.exp, 150);
        assert!(!claims.is_expired_at(150));
        assert!(claims.is_expired_at(151));
    }

    #[test]
    fn access_claims_carry_jwt_typ() {
        let claims = TokenClaims::access(
            "u1",
            "acme_app",
            Some("acme_app".into()),
            Some("Ada Lovelace".into()),
            0,
            Duration::from_secs(900),
        );
        assert_eq!(claims.typ.as_deref(), Some("JWT"));
        assert_eq!(claims.token_use, TokenKind::Access);
        assert_eq!(claims.missing_claim(), None);
    }

    #[test]
    fn empty_subject_is_reported_missing() {
        let claims = TokenClaims::refresh("", "iss", 10, Duration::from_secs(1));
        assert_eq!(claims.missing_claim(), Some("sub"));
    }

    #[test]
    fn refresh_claims_omit_access_only_fields() {
        let claims = TokenClaims::refresh("u1", "iss", 1, Duration::from_secs(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("aud").is_none());
        assert!(json.get("name").is_none());
        assert_eq!(json["token_use"], "refresh");
    }

    #[test]
    fn token_pair_serializes_ttl_in_seconds() {
        let pair = TokenPair {
            access_token: Token {
                text: "a".into(),
                ttl: Duration::from_secs(900),
            },
            refresh_token: Token {
                text: "r".into(),
                ttl: Duration::from_secs(86_400),
            },
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["token"]["expiry_time"], 900);
        assert_eq!(json["refresh_token"]["access_token"], "r");
    }
}
