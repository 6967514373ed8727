use super::util::{is_dup_key, store_err};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserStore {
    pool: MySqlPool,
}

impl MySqlUserStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let decode = store_err("decode user");

        let profile_json: String = row.try_get("profile").map_err(&decode)?;
        let profile: UserProfile = serde_json::from_str(&profile_json)
            .map_err(|e| AuthError::Store(format!("decode profile: {e}")))?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(&decode)?;

        Ok(UserRecord {
            user: User {
                id: row.try_get::<UserId, _>("user_id").map_err(&decode)?,
                login_id: row.try_get("login_id").map_err(&decode)?,
                scope: UserScope {
                    domain: row.try_get("user_domain").map_err(&decode)?,
                    app_id: row.try_get("user_app_id").map_err(&decode)?,
                    role: UserRole {
                        role_name: row.try_get("role_name").map_err(&decode)?,
                        description: row.try_get("role_description").map_err(&decode)?,
                    },
                },
                profile,
            },
            password_hash: row.try_get("password_hash").map_err(&decode)?,
            created_at,
        })
    }

    async fn secret_exists(&self, user_id: &UserId, key_name: &str) -> Result<bool, AuthError> {
        let row = sqlx::query("SELECT 1 FROM third_party_secret WHERE user_id = ? AND key_name = ?")
            .bind(user_id)
            .bind(key_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("query secret"))?;
        Ok(row.is_some())
    }
}

#[async_trait::async_trait]
impl UserStore for MySqlUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserId, AuthError> {
        let user_id = UserId::generate();
        let profile = serde_json::to_string(&user.profile)
            .map_err(|e| AuthError::Store(format!("encode profile: {e}")))?;

        let res = sqlx::query(
            r#"
INSERT INTO user (user_id, login_id, password_hash, user_domain, user_app_id,
                  role_name, role_description, profile)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(&user_id)
        .bind(&user.login_id)
        .bind(&user.password_hash)
        .bind(&user.scope.domain)
        .bind(&user.scope.app_id)
        .bind(&user.scope.role.role_name)
        .bind(&user.scope.role.description)
        .bind(profile)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(user_id),
            Err(e) if is_dup_key(&e) => Err(AuthError::UserExists),
            Err(e) => Err(AuthError::Store(format!("insert user: {e}"))),
        }
    }

    async fn login_id_available(
        &self,
        login_id: &str,
        scope: &UserScope,
    ) -> Result<bool, AuthError> {
        let row = sqlx::query(
            "SELECT 1 FROM user WHERE login_id = ? AND user_domain = ? AND user_app_id = ?",
        )
        .bind(login_id)
        .bind(&scope.domain)
        .bind(&scope.app_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("query login id"))?;

        Ok(row.is_none())
    }

    async fn find_by_login_and_scope(
        &self,
        login_id: &str,
        domain: &str,
        app_id: &str,
    ) -> Result<UserRecord, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, login_id, password_hash, user_domain, user_app_id,
       role_name, role_description, CAST(profile AS CHAR) AS profile, created_at
FROM user
WHERE login_id = ? AND user_domain = ? AND user_app_id = ?
"#,
        )
        .bind(login_id)
        .bind(domain)
        .bind(app_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("query user"))?;

        row_opt
            .map(Self::row_to_record)
            .transpose()?
            .ok_or(AuthError::UserNotFound)
    }

    async fn lookup_secret(&self, user_id: &UserId, key_name: &str) -> Result<String, AuthError> {
        if let Some(row) = sqlx::query(
            "SELECT key_value FROM third_party_secret WHERE user_id = ? AND key_name = ?",
        )
        .bind(user_id)
        .bind(key_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("query secret"))?
        {
            return row
                .try_get::<String, _>("key_value")
                .map_err(store_err("decode secret"));
        }

        Err(AuthError::SecretNotFound)
    }

    async fn upsert_secret(
        &self,
        user_id: &UserId,
        secret: &ThirdPartySecret,
        operation: SecretOperation,
    ) -> Result<(), AuthError> {
        match operation {
            SecretOperation::Create => {
                let res = sqlx::query(
                    r#"
INSERT INTO third_party_secret (user_id, key_name, key_value, description)
VALUES (?, ?, ?, ?)
"#,
                )
                .bind(user_id)
                .bind(&secret.key_name)
                .bind(&secret.key_value)
                .bind(&secret.description)
                .execute(&self.pool)
                .await;

                match res {
                    Ok(_) => Ok(()),
                    Err(e) if is_dup_key(&e) => Err(AuthError::Validation(format!(
                        "secret '{}' already registered",
                        secret.key_name
                    ))),
                    Err(e) => Err(AuthError::Store(format!("insert secret: {e}"))),
                }
            }
            SecretOperation::Update => {
                let res = sqlx::query(
                    r#"
UPDATE third_party_secret SET key_value = ?, description = ?
WHERE user_id = ? AND key_name = ?
"#,
                )
                .bind(&secret.key_value)
                .bind(&secret.description)
                .bind(user_id)
                .bind(&secret.key_name)
                .execute(&self.pool)
                .await
                .map_err(store_err("update secret"))?;

                // MySQL reports changed rows, not matched rows.
                if res.rows_affected() == 0 && !self.secret_exists(user_id, &secret.key_name).await? {
                    return Err(AuthError::SecretNotFound);
                }
                Ok(())
            }
        }
    }
}
