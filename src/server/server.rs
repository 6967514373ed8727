use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::CacheJanitor;
use crate::settings::{Jwt, Settings};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

fn checked_secs(name: &str, secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 || secs > MAX_DURATION_SECS {
        return Err(anyhow::anyhow!(
            "jwt.{} must be between 1 and {} seconds, got {}",
            name,
            MAX_DURATION_SECS,
            secs
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn session_config(jwt: &Jwt) -> anyhow::Result<SessionConfig> {
    if jwt.domain.is_empty() || jwt.app_id.is_empty() {
        return Err(anyhow::anyhow!("jwt.domain and jwt.app_id are required"));
    }
    Ok(SessionConfig {
        token_ttl: checked_secs("token_ttl_secs", jwt.token_ttl_secs)?,
        refresh_ttl: checked_secs("refresh_ttl_secs", jwt.refresh_ttl_secs)?,
        cache_flush_interval: checked_secs(
            "cache_flush_interval_secs",
            jwt.cache_flush_interval_secs,
        )?,
        ..SessionConfig::new(&jwt.domain, &jwt.app_id, jwt.max_refresh_count)
    })
}

pub struct Server {
    pub account_service: Arc<dyn AccountService>,
    pub session_service: Arc<dyn SessionService>,
    pub cache: Arc<SecretCache>,
    janitor_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let jwt = &settings.jwt;
        let session_config = session_config(jwt)?;

        let mut pool = None;
        let user_store: Arc<dyn UserStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryUserStore::new()),
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.mysql_dsn is required for mysql"))?;
                let mysql = MySqlPoolOptions::new()
                    .max_connections(10)
                    .connect(dsn)
                    .await?;
                pool = Some(mysql.clone());
                Arc::new(MySqlUserStore::new(mysql))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let secret_cipher: Arc<dyn SecretCipher> = match settings.cipher.backend.as_str() {
            "fake" => Arc::new(FakeSecretCipher::new()),
            "real" => {
                let master_key = settings
                    .cipher
                    .master_key
                    .as_deref()
                    .filter(|key| !key.is_empty())
                    .ok_or_else(|| anyhow::anyhow!("cipher.master_key is required for real"))?;
                Arc::new(AesGcmSecretCipher::new(master_key))
            }
            other => return Err(anyhow::anyhow!("Unknown cipher backend: {}", other)),
        };

        let cache = Arc::new(SecretCache::new());
        let flush_interval = session_config.cache_flush_interval;
        let session_service: Arc<dyn SessionService> =
            Arc::new(RotationEngine::new(session_config, cache.clone()));

        let account_service: Arc<dyn AccountService> = Arc::new(RealAccountService::new(
            user_store,
            Arc::new(Argon2CredentialVerifier::new()),
            secret_cipher,
            session_service.clone(),
            format!("{}{}", jwt.domain, jwt.app_id),
        ));

        let cancel = CancellationToken::new();
        let janitor_handle = CacheJanitor::new(cache.clone(), flush_interval, cancel.clone()).spawn();

        info!(
            store = %settings.store.backend,
            cipher = %settings.cipher.backend,
            "server started"
        );

        Ok(Self {
            account_service,
            session_service,
            cache,
            janitor_handle: Mutex::new(Some(janitor_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self
            .janitor_handle
            .lock()
            .ok()
            .and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("janitor handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> Jwt {
        Jwt {
            domain: "acme".into(),
            app_id: "app".into(),
            max_refresh_count: 3,
            token_ttl_secs: 900,
            refresh_ttl_secs: 86400,
            cache_flush_interval_secs: 86400,
        }
    }

    #[test]
    fn session_config_takes_durations_from_settings() {
        let config = session_config(&jwt()).unwrap();
        assert_eq!(config.issuer, "acme_app");
        assert_eq!(config.token_ttl, Duration::from_secs(900));
        assert_eq!(config.cache_flush_interval, Duration::from_secs(86400));
    }

    #[test]
    fn zero_or_huge_durations_are_rejected() {
        let mut zero_flush = jwt();
        zero_flush.cache_flush_interval_secs = 0;
        assert!(session_config(&zero_flush).is_err());

        let mut zero_refresh = jwt();
        zero_refresh.refresh_ttl_secs = 0;
        assert!(session_config(&zero_refresh).is_err());

        let mut huge = jwt();
        huge.token_ttl_secs = u64::MAX;
        assert!(session_config(&huge).is_err());
    }
}
