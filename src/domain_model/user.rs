use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        UserId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_owned())
    }
}

pub const ADMIN_ROLE: &str = "admin_user";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub role_name: String,
    #[serde(default)]
    pub description: String,
}

/// The tenant a login id belongs to. The same login id may exist once per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScope {
    #[serde(rename = "user_domain")]
    pub domain: String,
    #[serde(rename = "user_app_id")]
    pub app_id: String,
    #[serde(rename = "user_role")]
    pub role: UserRole,
}

impl UserScope {
    /// `<domain>_<app_id>`, used as the access token audience.
    pub fn audience(&self) -> String {
        format!("{}_{}", self.domain, self.app_id)
    }

    pub fn same_tenant(&self, other: &UserScope) -> bool {
        self.domain == other.domain && self.app_id == other.app_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, rename = "zip_code")]
    pub zip_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub login_id: String,
    pub scope: UserScope,
    pub profile: UserProfile,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.scope.role.role_name == ADMIN_ROLE
    }
}

/// A named third-party signing secret. `key_value` is plaintext on the way in
/// and ciphertext once it reaches a `UserStore`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThirdPartySecret {
    pub key_name: String,
    #[serde(default)]
    pub key_value: String,
    #[serde(default)]
    pub description: String,
}
