use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

struct StoredUser {
    record: UserRecord,
    secrets: Vec<ThirdPartySecret>,
}

type LoginKey = (String, String, String);

fn login_key(login_id: &str, domain: &str, app_id: &str) -> LoginKey {
    (login_id.to_string(), domain.to_string(), app_id.to_string())
}

/// `UserStore` kept in process memory. Used by the `memory` store backend and
/// by tests; nothing survives a restart.
///
/// `logins` indexes `(login_id, domain, app_id)` and is the uniqueness guard
/// for `create_user`.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<UserId, StoredUser>,
    logins: DashMap<LoginKey, UserId>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        MemoryUserStore {
            users: DashMap::new(),
            logins: DashMap::new(),
        }
    }

    fn find_by_login(&self, login_id: &str, domain: &str, app_id: &str) -> Option<UserRecord> {
        let user_id = self
            .logins
            .get(&login_key(login_id, domain, app_id))
            .map(|entry| entry.value().clone())?;
        self.users.get(&user_id).map(|entry| entry.record.clone())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserId, AuthError> {
        let key = login_key(&user.login_id, &user.scope.domain, &user.scope.app_id);
        // The vacant entry stays locked until the user row is in place.
        let Entry::Vacant(slot) = self.logins.entry(key) else {
            return Err(AuthError::UserExists);
        };

        let user_id = UserId::generate();
        let record = UserRecord {
            user: User {
                id: user_id.clone(),
                login_id: user.login_id,
                scope: user.scope,
                profile: user.profile,
            },
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        self.users.insert(
            user_id.clone(),
            StoredUser {
                record,
                secrets: Vec::new(),
            },
        );
        slot.insert(user_id.clone());
        Ok(user_id)
    }

    async fn login_id_available(
        &self,
        login_id: &str,
        scope: &UserScope,
    ) -> Result<bool, AuthError> {
        let key = login_key(login_id, &scope.domain, &scope.app_id);
        Ok(!self.logins.contains_key(&key))
    }

    async fn find_by_login_and_scope(
        &self,
        login_id: &str,
        domain: &str,
        app_id: &str,
    ) -> Result<UserRecord, AuthError> {
        self.find_by_login(login_id, domain, app_id)
            .ok_or(AuthError::UserNotFound)
    }

    async fn lookup_secret(&self, user_id: &UserId, key_name: &str) -> Result<String, AuthError> {
        let stored = self.users.get(user_id).ok_or(AuthError::UserNotFound)?;
        stored
            .secrets
            .iter()
            .find(|secret| secret.key_name == key_name)
            .map(|secret| secret.key_value.clone())
            .ok_or(AuthError::SecretNotFound)
    }

    async fn upsert_secret(
        &self,
        user_id: &UserId,
        secret: &ThirdPartySecret,
        operation: SecretOperation,
    ) -> Result<(), AuthError> {
        let Entry::Occupied(mut entry) = self.users.entry(user_id.clone()) else {
            return Err(AuthError::UserNotFound);
        };
        let secrets = &mut entry.get_mut().secrets;
        let existing = secrets.iter().position(|s| s.key_name == secret.key_name);

        match (operation, existing) {
            (SecretOperation::Create, None) => secrets.push(secret.clone()),
            (SecretOperation::Create, Some(_)) => {
                return Err(AuthError::Validation(format!(
                    "secret '{}' already registered",
                    secret.key_name
                )));
            }
            (SecretOperation::Update, Some(index)) => secrets[index] = secret.clone(),
            (SecretOperation::Update, None) => return Err(AuthError::SecretNotFound),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn scope(domain: &str, app_id: &str) -> UserScope {
        UserScope {
            domain: domain.into(),
            app_id: app_id.into(),
            role: UserRole::default(),
        }
    }

    fn new_user(login_id: &str) -> NewUser {
        NewUser {
            login_id: login_id.into(),
            password_hash: "hash".into(),
            scope: scope("acme", "app"),
            profile: UserProfile::default(),
        }
    }

    #[tokio::test]
    async fn find_requires_matching_scope() {
        let store = MemoryUserStore::new();
        let id = store.create_user(new_user("alice")).await.unwrap();

        let found = store
            .find_by_login_and_scope("alice", "acme", "app")
            .await
            .unwrap();
        assert_eq!(found.user.id, id);

        let other = store.find_by_login_and_scope("alice", "acme", "other").await;
        assert!(matches!(other, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn login_id_is_unique_per_scope() {
        let store = MemoryUserStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        assert!(!store.login_id_available("alice", &scope("acme", "app")).await.unwrap());
        assert!(store.login_id_available("alice", &scope("acme", "b")).await.unwrap());
        assert!(store.login_id_available("bob", &scope("acme", "app")).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = MemoryUserStore::new();
        let first = store.create_user(new_user("alice")).await.unwrap();

        let again = store.create_user(new_user("alice")).await;
        assert!(matches!(again, Err(AuthError::UserExists)));
        assert_eq!(
            store
                .find_by_login_and_scope("alice", "acme", "app")
                .await
                .unwrap()
                .user
                .id,
            first
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_admit_one_user() {
        let store = Arc::new(MemoryUserStore::new());
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_user(new_user("alice")).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(AuthError::UserExists) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.users.len(), 1);
    }

    #[tokio::test]
    async fn secrets_create_update_and_lookup() {
        let store = MemoryUserStore::new();
        let id = store.create_user(new_user("alice")).await.unwrap();
        let mut secret = ThirdPartySecret {
            key_name: "main".into(),
            key_value: "c1".into(),
            description: String::new(),
        };

        store
            .upsert_secret(&id, &secret, SecretOperation::Create)
            .await
            .unwrap();
        assert_eq!(store.lookup_secret(&id, "main").await.unwrap(), "c1");

        let duplicate = store.upsert_secret(&id, &secret, SecretOperation::Create).await;
        assert!(matches!(duplicate, Err(AuthError::Validation(_))));

        secret.key_value = "c2".into();
        store
            .upsert_secret(&id, &secret, SecretOperation::Update)
            .await
            .unwrap();
        assert_eq!(store.lookup_secret(&id, "main").await.unwrap(), "c2");

        let missing = store.lookup_secret(&id, "other").await;
        assert!(matches!(missing, Err(AuthError::SecretNotFound)));
    }

    #[tokio::test]
    async fn update_of_unknown_key_fails() {
        let store = MemoryUserStore::new();
        let id = store.create_user(new_user("alice")).await.unwrap();
        let secret = ThirdPartySecret {
            key_name: "nope".into(),
            ..Default::default()
        };
        let result = store.upsert_secret(&id, &secret, SecretOperation::Update).await;
        assert!(matches!(result, Err(AuthError::SecretNotFound)));
    }
}
